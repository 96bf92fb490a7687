use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    Schema,
};
use time::OffsetDateTime;

use crate::entity::{deployment_cache, platform_credential, user};

/// Current time at the precision every backend stores (Postgres keeps
/// microseconds), so a written timestamp compares equal once read back
pub fn now_micros() -> OffsetDateTime {
    truncate_to_micros(OffsetDateTime::now_utc())
}

pub fn truncate_to_micros(instant: OffsetDateTime) -> OffsetDateTime {
    instant
        .replace_nanosecond(instant.nanosecond() / 1_000 * 1_000)
        .unwrap_or(instant)
}

/// Open the shared connection pool for `database_url`
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    if database_url.contains(":memory:") {
        // Every pooled connection to an in-memory SQLite database sees its own
        // empty database, so keep exactly one.
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(100).min_connections(5);
    }
    opt.sqlx_logging(true);

    Database::connect(opt).await
}

/// Bring the schema up to date.
///
/// Postgres runs the versioned SQL migrations in `migrations/`; other backends
/// (SQLite for local runs and tests) get tables derived from the entities.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    match db.get_database_backend() {
        DbBackend::Postgres => sqlx::migrate!("./migrations")
            .run(db.get_postgres_connection_pool())
            .await
            .map_err(|e| DbErr::Migration(e.to_string())),
        _ => create_schema(db).await,
    }
}

/// Create all tables from the SeaORM entities if they do not exist yet
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, user::Entity).await?;
    create_table(db, platform_credential::Entity).await?;
    create_table(db, deployment_cache::Entity).await?;
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_micros_drops_nanoseconds() {
        let instant = time::macros::datetime!(2025-06-01 12:00:00.123456789 UTC);
        assert_eq!(
            truncate_to_micros(instant),
            time::macros::datetime!(2025-06-01 12:00:00.123456 UTC)
        );
    }
}
