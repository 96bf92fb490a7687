use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::{now_micros, truncate_to_micros};
use crate::entity::deployment_cache::{self, Column};
use crate::entity::{DeploymentCache as CacheEntity, PlatformCredential as CredentialEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Credential, Deployment, DeploymentStatus, Metadata};
use crate::platforms::PlatformRegistry;

/// Cached deployments of one credential plus the instant they were stored
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub deployments: Vec<Deployment>,
    /// `UNIX_EPOCH` when the snapshot is empty
    pub last_updated_at: OffsetDateTime,
}

/// Per-credential deployment cache backed by the `deployment_cache` table.
///
/// A snapshot is the set of rows sharing a credential id. It is always
/// replaced as a whole and every row carries the same `last_updated_at`.
#[derive(Clone)]
pub struct DeploymentCache {
    db: DatabaseConnection,
    platforms: Arc<PlatformRegistry>,
    ttl: Duration,
}

impl DeploymentCache {
    pub fn new(
        db: DatabaseConnection,
        platforms: Arc<PlatformRegistry>,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            db,
            platforms,
            ttl: Duration::try_from(ttl).unwrap_or(Duration::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a snapshot stamped at `last_updated_at` is still usable
    pub fn is_fresh(&self, last_updated_at: OffsetDateTime) -> bool {
        self.is_fresh_at(last_updated_at, OffsetDateTime::now_utc())
    }

    pub fn is_fresh_at(&self, last_updated_at: OffsetDateTime, now: OffsetDateTime) -> bool {
        now - last_updated_at < self.ttl
    }

    /// Latest `last_updated_at` of the credential's snapshot, `None` if no rows
    pub async fn exists(&self, credential_id: Uuid) -> AppResult<Option<OffsetDateTime>> {
        let stamps: Vec<OffsetDateTime> = CacheEntity::find()
            .select_only()
            .column(Column::LastUpdatedAt)
            .filter(Column::PlatformCredentialId.eq(credential_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(stamps.into_iter().max())
    }

    /// Read the snapshot in platform response order
    pub async fn get(&self, credential_id: Uuid) -> AppResult<Snapshot> {
        let rows = CacheEntity::find()
            .filter(Column::PlatformCredentialId.eq(credential_id))
            .order_by_asc(Column::Position)
            .all(&self.db)
            .await?;

        let last_updated_at = rows
            .iter()
            .map(|row| row.last_updated_at)
            .max()
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        let deployments = rows
            .into_iter()
            .map(Deployment::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Snapshot {
            deployments,
            last_updated_at,
        })
    }

    /// Replace the credential's snapshot, stamped with the current time
    pub async fn store(&self, credential_id: Uuid, deployments: &[Deployment]) -> AppResult<()> {
        self.store_at(credential_id, deployments, OffsetDateTime::now_utc())
            .await
    }

    /// Replace the credential's snapshot in one transaction, stamping every
    /// row with `stored_at`. On any failure the previous snapshot survives.
    pub async fn store_at(
        &self,
        credential_id: Uuid,
        deployments: &[Deployment],
        stored_at: OffsetDateTime,
    ) -> AppResult<()> {
        let stored_at = truncate_to_micros(stored_at);
        let rows = to_active_models(credential_id, deployments, stored_at)?;

        let txn = self.db.begin().await?;
        let replaced = replace_rows(&txn, credential_id, rows).await?;
        txn.commit().await?;

        debug!(
            %credential_id,
            replaced,
            stored = deployments.len(),
            "Stored deployment snapshot"
        );

        Ok(())
    }

    /// Like `store_at`, but only while the credential row is still the version
    /// the deployments were fetched with. Returns `false` and writes nothing
    /// when the credential was updated or deleted in the meantime.
    async fn store_if_current(
        &self,
        credential: &Credential,
        deployments: &[Deployment],
        stored_at: OffsetDateTime,
    ) -> AppResult<bool> {
        let rows = to_active_models(credential.id, deployments, stored_at)?;

        let txn = self.db.begin().await?;

        // Row lock on Postgres holds off a concurrent update until commit
        let current = CredentialEntity::find_by_id(credential.id)
            .lock_exclusive()
            .one(&txn)
            .await?;

        match current {
            Some(row) if row.updated_at == credential.updated_at => {}
            _ => {
                txn.rollback().await?;
                return Ok(false);
            }
        }

        replace_rows(&txn, credential.id, rows).await?;
        txn.commit().await?;

        Ok(true)
    }

    /// Drop the credential's snapshot so the next read goes to the platform
    pub async fn invalidate(&self, credential_id: Uuid) -> AppResult<u64> {
        let result = CacheEntity::delete_many()
            .filter(Column::PlatformCredentialId.eq(credential_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Serve the cached snapshot while fresh, otherwise fetch from the
    /// credential's platform and replace it.
    ///
    /// A failed fetch or store leaves the old snapshot in place and returns
    /// the error. A fetch made with a credential version that has since been
    /// updated is returned but not stored. Concurrent callers that both see a
    /// stale snapshot may both refresh; the last commit wins.
    #[instrument(skip_all, fields(credential_id = %credential.id, platform = %credential.platform))]
    pub async fn get_fresh_or_refresh(&self, credential: &Credential) -> AppResult<Vec<Deployment>> {
        if let Some(last_updated_at) = self.exists(credential.id).await? {
            if self.is_fresh(last_updated_at) {
                debug!("Deployment cache hit");
                return Ok(self.get(credential.id).await?.deployments);
            }
            debug!(%last_updated_at, "Deployment cache stale");
        } else {
            debug!("Deployment cache miss");
        }

        let adapter = self.platforms.get(&credential.platform)?;
        let mut deployments = adapter.fetch_deployments(&credential.api_key).await?;

        let stored_at = now_micros();
        for deployment in &mut deployments {
            deployment.platform_credential_id = credential.id;
            deployment.last_updated_at = stored_at;
        }

        if self
            .store_if_current(credential, &deployments, stored_at)
            .await?
        {
            info!(count = deployments.len(), "Refreshed deployment cache");
        } else {
            info!("Credential changed during refresh, snapshot not stored");
        }

        Ok(deployments)
    }
}

fn to_active_models(
    credential_id: Uuid,
    deployments: &[Deployment],
    stored_at: OffsetDateTime,
) -> AppResult<Vec<deployment_cache::ActiveModel>> {
    deployments
        .iter()
        .enumerate()
        .map(|(position, deployment)| to_active_model(credential_id, position, deployment, stored_at))
        .collect()
}

/// Delete the credential's rows and insert `rows`; returns how many were replaced
async fn replace_rows(
    txn: &DatabaseTransaction,
    credential_id: Uuid,
    rows: Vec<deployment_cache::ActiveModel>,
) -> AppResult<u64> {
    let cleared = CacheEntity::delete_many()
        .filter(Column::PlatformCredentialId.eq(credential_id))
        .exec(txn)
        .await?;

    if !rows.is_empty() {
        CacheEntity::insert_many(rows)
            .exec_without_returning(txn)
            .await?;
    }

    Ok(cleared.rows_affected)
}

fn to_active_model(
    credential_id: Uuid,
    position: usize,
    deployment: &Deployment,
    stored_at: OffsetDateTime,
) -> AppResult<deployment_cache::ActiveModel> {
    let position = i32::try_from(position)
        .map_err(|_| AppError::Internal("Too many deployments in snapshot".to_string()))?;

    Ok(deployment_cache::ActiveModel {
        id: Set(deployment.id.clone()),
        platform_credential_id: Set(credential_id),
        position: Set(position),
        name: Set(deployment.name.clone()),
        status: Set(deployment.status.as_str().to_string()),
        url: Set(deployment.url.clone()),
        last_deployed_at: Set(deployment.last_deployed_at),
        branch: Set(deployment.branch.clone()),
        service_type: Set(deployment.service_type.clone()),
        framework: Set(deployment.framework.clone()),
        last_updated_at: Set(stored_at),
        metadata: Set(Some(serde_json::to_string(&deployment.metadata)?)),
    })
}

impl TryFrom<deployment_cache::Model> for Deployment {
    type Error = AppError;

    fn try_from(model: deployment_cache::Model) -> AppResult<Self> {
        let metadata = match model.metadata.as_deref().map(str::trim) {
            None | Some("") => Metadata::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw)? {
                Value::Object(map) => map,
                Value::Null => Metadata::new(),
                other => {
                    return Err(AppError::Database(format!(
                        "Cached metadata for {} is not an object: {}",
                        model.id, other
                    )))
                }
            },
        };

        Ok(Deployment {
            id: model.id,
            platform_credential_id: model.platform_credential_id,
            name: model.name,
            status: DeploymentStatus::from_stored(&model.status),
            url: model.url,
            last_deployed_at: model.last_deployed_at,
            branch: model.branch,
            service_type: model.service_type,
            framework: model.framework,
            last_updated_at: model.last_updated_at,
            metadata,
        })
    }
}
