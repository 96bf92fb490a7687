use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One cached deployment row. Rows sharing a `platform_credential_id` form
/// that credential's snapshot and are always replaced together.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deployment_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub platform_credential_id: Uuid,
    /// Index within the platform response
    pub position: i32,
    pub name: String,
    pub status: String,
    pub url: String,
    pub last_deployed_at: Option<TimeDateTimeWithTimeZone>,
    pub branch: String,
    pub service_type: String,
    pub framework: String,
    pub last_updated_at: TimeDateTimeWithTimeZone,
    /// JSON object text
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::platform_credential::Entity",
        from = "Column::PlatformCredentialId",
        to = "super::platform_credential::Column::Id",
        on_delete = "Cascade"
    )]
    PlatformCredential,
}

impl Related<super::platform_credential::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlatformCredential.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
