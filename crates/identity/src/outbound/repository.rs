use app_core::error::AppError;
use async_trait::async_trait;

use crate::domain::entity::user::User;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// Finds a single user by their unique email.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` if a matching row exists.
    /// * `Ok(None)` if no row matches the given email.
    /// * `Err(AppError)` if a database or mapping error occurs.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Inserts a new user row. Fails if the id or email already exists.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    /// Overwrites every mutable column of the row matching `user.id`.
    ///
    /// Used both for the event-driven overwrite and for restoring a
    /// snapshot during compensation.
    ///
    /// # Returns
    ///
    /// * `Err(AppError::NotFound)` if no row matches the id.
    async fn update(&self, user: &User) -> Result<(), AppError>;

    /// Deletes the row matching the subject id, returning how many rows were
    /// removed. Zero is not an error; the caller decides what absence means.
    async fn delete_by_id(&self, id: &str) -> Result<u64, AppError>;
}
