mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::provider::IdentityProvider;
use app_core::webhook::SignatureScheme;
pub use inbound::router::create_router;
pub use inbound::state::IdentityState;
use sea_orm::DatabaseConnection;

use crate::outbound::orm::UserORM;
use crate::usecase::sync::SyncService;

pub struct Dependency {
    pub db: Arc<DatabaseConnection>,
    pub verifier: Arc<SignatureScheme>,
    pub provider: Arc<dyn IdentityProvider>,
}

pub fn new(dep: Dependency) -> IdentityState {
    let repo = Arc::new(UserORM::new(dep.db));
    let sync = Arc::new(SyncService::new(repo, dep.provider));

    IdentityState::new(dep.verifier, sync)
}
