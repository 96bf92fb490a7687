use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "platform_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub platform: String,
    pub name: String,
    /// AES-256-GCM ciphertext (base64 of nonce || ciphertext)
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub api_key: String,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::deployment_cache::Entity")]
    DeploymentCache,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::deployment_cache::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeploymentCache.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
