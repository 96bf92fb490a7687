use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::now_micros;
use crate::entity::platform_credential::{self, ActiveModel, Column, Entity as CredentialEntity};
use crate::error::{AppError, AppResult};
use crate::models::{normalize_platform, CreateCredential, Credential, UpdateCredential};
use crate::services::SecretCipher;

/// Owner-scoped access to platform credentials.
///
/// Secrets are sealed with `SecretCipher` on the way in and opened on the way
/// out, so callers only ever see plaintext `Credential`s. Lookups that miss
/// and lookups of another user's credential both yield `NotFound`.
pub struct CredentialRepository;

impl CredentialRepository {
    pub async fn create(
        db: &DatabaseConnection,
        cipher: &SecretCipher,
        user_id: &str,
        input: &CreateCredential,
    ) -> AppResult<Credential> {
        let now = now_micros();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            platform: Set(normalize_platform(&input.platform)),
            name: Set(input.name.trim().to_string()),
            api_key: Set(cipher.encrypt(&input.api_key)?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await?;
        Self::open(cipher, result)
    }

    /// Find credential by ID and verify ownership
    pub async fn find_by_id_and_owner(
        db: &DatabaseConnection,
        cipher: &SecretCipher,
        id: Uuid,
        user_id: &str,
    ) -> AppResult<Credential> {
        let model = find_model(db, id, user_id).await?;
        Self::open(cipher, model)
    }

    /// All credentials of a user, oldest first
    pub async fn list_by_owner(
        db: &DatabaseConnection,
        cipher: &SecretCipher,
        user_id: &str,
    ) -> AppResult<Vec<Credential>> {
        Self::list_sealed_by_owner(db, user_id)
            .await?
            .into_iter()
            .map(|m| Self::open(cipher, m))
            .collect()
    }

    /// Same rows as `list_by_owner` with secrets still sealed, for callers
    /// that open each one separately
    pub async fn list_sealed_by_owner(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> AppResult<Vec<platform_credential::Model>> {
        let models = CredentialEntity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(models)
    }

    /// Decrypt a stored row into a `Credential`
    pub fn open(cipher: &SecretCipher, m: platform_credential::Model) -> AppResult<Credential> {
        Ok(Credential {
            api_key: cipher.decrypt(&m.api_key)?,
            id: m.id,
            user_id: m.user_id,
            platform: m.platform,
            name: m.name,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }

    /// Update credential (with ownership check)
    pub async fn update(
        db: &DatabaseConnection,
        cipher: &SecretCipher,
        id: Uuid,
        user_id: &str,
        input: &UpdateCredential,
    ) -> AppResult<Credential> {
        let model = find_model(db, id, user_id).await?;
        let mut active: ActiveModel = model.into();

        if let Some(platform) = &input.platform {
            active.platform = Set(normalize_platform(platform));
        }
        if let Some(name) = &input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(api_key) = &input.api_key {
            active.api_key = Set(cipher.encrypt(api_key)?);
        }
        active.updated_at = Set(now_micros());

        let result = active.update(db).await?;
        Self::open(cipher, result)
    }

    /// Delete credential (with ownership check); its cached deployments cascade
    pub async fn delete_by_owner(db: &DatabaseConnection, id: Uuid, user_id: &str) -> AppResult<()> {
        let result = CredentialEntity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Credential".to_string()));
        }

        Ok(())
    }
}

async fn find_model(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: &str,
) -> AppResult<platform_credential::Model> {
    CredentialEntity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Credential".to_string()))
}
