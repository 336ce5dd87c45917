use std::sync::Arc;

use app_core::error::AppError;
use app_orm::prelude::Users;
use app_orm::users;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::repository::UserRepository;
use crate::domain::entity::user::{User, UserRole};

/// SeaORM-backed data access for the local `users` table.
pub struct UserORM {
    db: Arc<DatabaseConnection>,
}

impl UserORM {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_user(&self, model: users::Model) -> User {
        User {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            avatar_url: model.avatar_url,
            role: UserRole::from(model.role),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[async_trait]
impl UserRepository for UserORM {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let model = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(|m| self.to_user(m)))
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let now = Utc::now().fixed_offset();
        let model = users::ActiveModel {
            id: ActiveValue::Set(user.id.clone()),
            email: ActiveValue::Set(user.email.clone()),
            full_name: ActiveValue::Set(user.full_name.clone()),
            avatar_url: ActiveValue::Set(user.avatar_url.clone()),
            role: ActiveValue::Set(user.role.as_str().to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        Users::insert(model).exec(self.db.as_ref()).await?;

        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let model = users::ActiveModel {
            email: ActiveValue::Set(user.email.clone()),
            full_name: ActiveValue::Set(user.full_name.clone()),
            avatar_url: ActiveValue::Set(user.avatar_url.clone()),
            role: ActiveValue::Set(user.role.as_str().to_string()),
            updated_at: ActiveValue::Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        let result = Users::update_many()
            .set(model)
            .filter(users::Column::Id.eq(user.id.clone()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64, AppError> {
        let result = Users::delete_by_id(id).exec(self.db.as_ref()).await?;

        Ok(result.rows_affected)
    }
}
