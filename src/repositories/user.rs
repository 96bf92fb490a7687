use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, DatabaseConnection, EntityTrait, Set,
};

use crate::entity::user::{self, ActiveModel, Column, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{UpdateUser, User};

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> AppResult<User> {
        let model = UserEntity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(model.into())
    }

    /// Return the user for a token subject, creating the row on first sight.
    ///
    /// Concurrent first requests for the same subject race on the primary
    /// key; the loser's insert is ignored and both read the same row.
    pub async fn find_or_create(
        db: &DatabaseConnection,
        id: &str,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> AppResult<User> {
        if let Some(model) = UserEntity::find_by_id(id.to_string()).one(db).await? {
            return Ok(model.into());
        }

        let email = match email.map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => format!("{}@unknown.com", id),
        };

        let model = ActiveModel {
            id: Set(id.to_string()),
            email: Set(email),
            display_name: Set(display_name.map(String::from)),
            created_at: Set(crate::db::now_micros()),
        };

        UserEntity::insert(model)
            .on_conflict(OnConflict::column(Column::Id).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;

        tracing::info!(user_id = %id, "Created user on first sign-in");

        Self::find_by_id(db, id).await
    }

    /// Update user
    pub async fn update(db: &DatabaseConnection, id: &str, input: &UpdateUser) -> AppResult<User> {
        let model = UserEntity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let mut active: ActiveModel = model.into();

        if let Some(display_name) = &input.display_name {
            active.display_name = Set(Some(display_name.clone()));
        }
        if let Some(email) = &input.email {
            active.email = Set(email.clone());
        }

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Delete the user; credentials and their cached deployments cascade
    pub async fn delete(db: &DatabaseConnection, id: &str) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id.to_string()).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            display_name: m.display_name,
            created_at: m.created_at,
        }
    }
}
