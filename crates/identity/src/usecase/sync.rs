use std::sync::Arc;

use app_core::error::AppError;
use app_core::provider::IdentityProvider;
use async_trait::async_trait;

use crate::domain::entity::user::User;
use crate::domain::event::SubjectProfile;
use crate::outbound::repository::UserRepository;

/// Mirrors provider identity events into the local store and pushes the
/// resolved role back into the provider's private metadata.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SyncUseCase: Send + Sync {
    /// Applies a `user.created` or `role.updated` event: upsert keyed on
    /// email, then a metadata write-back with the role as now stored.
    async fn upsert_from_event(&self, profile: SubjectProfile) -> Result<(), AppError>;

    /// Applies a `user.deleted` event. Deleting an already-absent subject is
    /// treated as success, so duplicate or out-of-order deliveries no-op.
    async fn delete_subject(&self, subject_id: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SyncService {
    repo: Arc<dyn UserRepository>,
    provider: Arc<dyn IdentityProvider>,
}

impl SyncService {
    pub fn new(repo: Arc<dyn UserRepository>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { repo, provider }
    }

    /// Undoes the local mutation after a failed metadata write so the two
    /// stores do not drift apart. A failing compensation is logged and
    /// swallowed; the original failure is what the caller must see.
    async fn compensate(&self, subject_id: &str, snapshot: Option<&User>) {
        let outcome = match snapshot {
            Some(previous) => self.repo.update(previous).await,
            None => self.repo.delete_by_id(subject_id).await.map(|_| ()),
        };

        if let Err(err) = outcome {
            tracing::error!(subject_id, "Compensation after metadata failure also failed: {err}");
        }
    }
}

#[async_trait]
impl SyncUseCase for SyncService {
    async fn upsert_from_event(&self, profile: SubjectProfile) -> Result<(), AppError> {
        let snapshot = self.repo.find_by_email(&profile.email).await?;

        // Upsert keys on email: overwrite the matched row, otherwise insert
        // with the subject id as primary key and the role defaulted.
        let stored = match &snapshot {
            Some(existing) => {
                let mut next = existing.clone();
                next.email = profile.email.clone();
                next.full_name = profile.display_name();
                next.avatar_url = profile.avatar_url.clone();
                if let Some(role) = profile.role {
                    next.role = role;
                }
                self.repo.update(&next).await?;
                next
            },
            None => {
                let created = User::new(
                    profile.subject_id.clone(),
                    profile.email.clone(),
                    profile.display_name(),
                    profile.avatar_url.clone(),
                    profile.role.unwrap_or_default(),
                );
                self.repo.insert(&created).await?;
                created
            },
        };

        tracing::info!(
            subject_id = %profile.subject_id,
            role = stored.role.as_str(),
            "Synchronized user from identity event"
        );

        // The provider's session claims must reflect the role as stored
        // locally. If this write fails, roll the local mutation back before
        // surfacing the failure so redelivery starts from a clean slate.
        if let Err(err) = self
            .provider
            .update_private_metadata(&profile.subject_id, stored.role.as_str())
            .await
        {
            self.compensate(&profile.subject_id, snapshot.as_ref()).await;
            return Err(err.into());
        }

        Ok(())
    }

    async fn delete_subject(&self, subject_id: &str) -> Result<(), AppError> {
        let removed = self.repo.delete_by_id(subject_id).await?;

        if removed == 0 {
            tracing::warn!(subject_id, "Delete event for an unknown subject; treating as already removed");
        } else {
            tracing::info!(subject_id, "Removed user for delete event");
        }

        Ok(())
    }
}
