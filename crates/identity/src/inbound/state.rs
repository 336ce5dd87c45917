use std::sync::Arc;

use app_core::webhook::SignatureScheme;

use crate::usecase::sync::SyncUseCase;

#[derive(Clone)]
pub struct IdentityState {
    pub verifier: Arc<SignatureScheme>,
    pub sync: Arc<dyn SyncUseCase>,
}

impl IdentityState {
    pub fn new(verifier: Arc<SignatureScheme>, sync: Arc<dyn SyncUseCase>) -> Self {
        Self { verifier, sync }
    }
}
