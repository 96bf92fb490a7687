use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Users are keyed by the subject identifier issued by the token provider.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::platform_credential::Entity")]
    PlatformCredentials,
}

impl Related<super::platform_credential::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlatformCredentials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
