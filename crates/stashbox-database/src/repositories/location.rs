//! Location repository implementation.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use stashbox_core::path::LocationPath;
use stashbox_core::result::AppResult;
use stashbox_entity::location::{CreateLocation, Location};

use crate::error::map_db_error;

const LOCATION_COLUMNS: &str =
    "id, workspace_id, name, description, path, depth, is_deleted, created_at, updated_at";

/// Repository for location rows and path-range queries.
///
/// Every query is scoped by `workspace_id`; a location is never visible
/// outside its workspace.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Create a new location repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a live location by ID.
    pub async fn find_by_id(&self, workspace_id: Uuid, id: Uuid) -> AppResult<Option<Location>> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations \
             WHERE id = $1 AND workspace_id = $2 AND NOT is_deleted"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to find location"))
    }

    /// Read a live location and hold a share lock on it.
    ///
    /// Used when a new row is about to depend on this location (a child
    /// path or a box placement) so that a concurrent rename or delete waits.
    pub async fn find_for_share_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Location>> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations \
             WHERE id = $1 AND workspace_id = $2 AND NOT is_deleted \
             FOR SHARE"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to lock location"))
    }

    /// Read a live location and hold an exclusive row lock on it.
    pub async fn lock_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Location>> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations \
             WHERE id = $1 AND workspace_id = $2 AND NOT is_deleted \
             FOR UPDATE"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to lock location"))
    }

    /// Lock every live descendant of `path` and return their paths.
    pub async fn lock_descendants_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        path: &LocationPath,
    ) -> AppResult<Vec<LocationPath>> {
        let (lower, upper) = path.descendant_range();
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT path FROM locations \
             WHERE workspace_id = $1 AND NOT is_deleted AND path >= $2 AND path < $3 \
             ORDER BY path \
             FOR UPDATE",
        )
        .bind(workspace_id)
        .bind(lower)
        .bind(upper)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to lock location subtree"))?;
        rows.into_iter().map(LocationPath::try_from).collect()
    }

    /// Whether a live location already occupies `path`.
    pub async fn path_exists_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        path: &LocationPath,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                SELECT 1 FROM locations \
                WHERE workspace_id = $1 AND path = $2 AND NOT is_deleted \
             )",
        )
        .bind(workspace_id)
        .bind(path.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to check location path"))
    }

    /// Insert a location.
    ///
    /// A concurrent insert of the same live path fails here with
    /// `SiblingConflict` via the partial unique index.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        data: &CreateLocation,
    ) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(&format!(
            "INSERT INTO locations (id, workspace_id, name, description, path) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(data.workspace_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.path.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to create location"))
    }

    /// Update a node's name, description, and path.
    pub async fn update_node_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        path: &LocationPath,
    ) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(&format!(
            "UPDATE locations \
             SET name = $3, description = $4, path = $5, updated_at = NOW() \
             WHERE id = $1 AND workspace_id = $2 AND NOT is_deleted \
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(id)
        .bind(workspace_id)
        .bind(name)
        .bind(description)
        .bind(path.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to update location"))
    }

    /// Rewrite the `old` prefix to `new` on every live descendant of `old`.
    ///
    /// Returns the number of rows rewritten. Callers must already hold the
    /// subtree locks from [`Self::lock_descendants_tx`].
    pub async fn rebase_descendants_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        old: &LocationPath,
        new: &LocationPath,
    ) -> AppResult<u64> {
        let (lower, upper) = old.descendant_range();
        let result = sqlx::query(
            "UPDATE locations \
             SET path = $4 || substr(path, char_length($5) + 1), updated_at = NOW() \
             WHERE workspace_id = $1 AND NOT is_deleted AND path >= $2 AND path < $3",
        )
        .bind(workspace_id)
        .bind(lower)
        .bind(upper)
        .bind(new.as_str())
        .bind(old.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to rewrite descendant paths"))?;
        Ok(result.rows_affected())
    }

    /// Set the soft-delete flag on a live location.
    pub async fn soft_delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE locations SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND workspace_id = $2 AND NOT is_deleted",
        )
        .bind(id)
        .bind(workspace_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to delete location"))?;
        Ok(result.rows_affected() > 0)
    }

    /// List live direct children of `parent`, or live roots when `None`.
    pub async fn find_children(
        &self,
        workspace_id: Uuid,
        parent: Option<&LocationPath>,
    ) -> AppResult<Vec<Location>> {
        let query = match parent {
            Some(parent) => {
                let (lower, upper) = parent.descendant_range();
                sqlx::query_as::<_, Location>(&format!(
                    "SELECT {LOCATION_COLUMNS} FROM locations \
                     WHERE workspace_id = $1 AND NOT is_deleted \
                       AND path >= $2 AND path < $3 AND depth = $4 \
                     ORDER BY name ASC, path ASC"
                ))
                .bind(workspace_id)
                .bind(lower)
                .bind(upper)
                .bind(parent.depth() as i32 + 1)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Location>(&format!(
                    "SELECT {LOCATION_COLUMNS} FROM locations \
                     WHERE workspace_id = $1 AND NOT is_deleted AND depth = 1 \
                     ORDER BY name ASC, path ASC"
                ))
                .bind(workspace_id)
                .fetch_all(&self.pool)
                .await
            }
        };
        query.map_err(|e| map_db_error(e, "Failed to list child locations"))
    }

    /// List live descendants of `root` (or the whole workspace), in path order.
    pub async fn find_subtree(
        &self,
        workspace_id: Uuid,
        root: Option<&LocationPath>,
    ) -> AppResult<Vec<Location>> {
        let query = match root {
            Some(root) => {
                let (lower, upper) = root.descendant_range();
                sqlx::query_as::<_, Location>(&format!(
                    "SELECT {LOCATION_COLUMNS} FROM locations \
                     WHERE workspace_id = $1 AND NOT is_deleted AND path >= $2 AND path < $3 \
                     ORDER BY path ASC"
                ))
                .bind(workspace_id)
                .bind(lower)
                .bind(upper)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Location>(&format!(
                    "SELECT {LOCATION_COLUMNS} FROM locations \
                     WHERE workspace_id = $1 AND NOT is_deleted \
                     ORDER BY path ASC"
                ))
                .bind(workspace_id)
                .fetch_all(&self.pool)
                .await
            }
        };
        query.map_err(|e| map_db_error(e, "Failed to list location subtree"))
    }

    /// Live locations sitting on the ancestor paths of `path`, root first.
    pub async fn find_ancestors(
        &self,
        workspace_id: Uuid,
        path: &LocationPath,
    ) -> AppResult<Vec<Location>> {
        let ancestors: Vec<String> = path.ancestors().into_iter().map(String::from).collect();
        if ancestors.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations \
             WHERE workspace_id = $1 AND NOT is_deleted AND path = ANY($2) \
             ORDER BY depth ASC"
        ))
        .bind(workspace_id)
        .bind(ancestors)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to find ancestor locations"))
    }

    /// Count boxes placed directly at each of the given locations.
    pub async fn count_boxes_batch(
        &self,
        workspace_id: Uuid,
        location_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, u64>> {
        if location_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT location_id, COUNT(*) FROM boxes \
             WHERE workspace_id = $1 AND location_id = ANY($2) \
             GROUP BY location_id",
        )
        .bind(workspace_id)
        .bind(location_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to count boxes per location"))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count as u64))
            .collect())
    }
}
