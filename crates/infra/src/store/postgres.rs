//! Postgres-backed stock store.
//!
//! Balance rows live in `skus` with a `version` column for optimistic
//! concurrency; the movement ledger is an append-only `movements` table.
//! Documents (orders, production orders, returns, cut batches) are stored as
//! JSONB payloads next to the columns the store itself needs (numbers,
//! references, the sync marker).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `VersionConflict` | Concurrent write detected (duplicate key) |
//! | Database (other) | Any other | `Unavailable` | Constraint or storage failure |
//! | PoolClosed | N/A | `Unavailable` | Connection pool was closed |
//! | RowNotFound | N/A | `NotFound` | Row lookup came back empty |
//! | Other | N/A | `Unavailable` | Network errors, connection failures, etc. |

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Row};
use std::sync::Arc;
use tracing::instrument;

use atelier_core::{CutBatchId, ExpectedVersion, MovementId, OrderId, ProductionOrderId, ReturnId, SkuId, VariantKey};
use atelier_cutwork::CutBatch;
use atelier_ledger::{Balances, Movement, MovementKind};
use atelier_orders::Order;
use atelier_production::ProductionOrder;
use atelier_returns::SalesReturn;

use super::{MovementFilter, SkuRecord, StockStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS skus (
        id UUID PRIMARY KEY,
        reference TEXT NOT NULL,
        color TEXT NOT NULL,
        size TEXT NOT NULL,
        physical BIGINT NOT NULL DEFAULT 0,
        reserved BIGINT NOT NULL DEFAULT 0,
        version BIGINT NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (reference, color, size)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movements (
        position BIGSERIAL PRIMARY KEY,
        id UUID NOT NULL UNIQUE,
        sku_id UUID NOT NULL REFERENCES skus (id),
        kind TEXT NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        occurred_at TIMESTAMPTZ NOT NULL,
        actor TEXT NOT NULL,
        note TEXT,
        reference TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS movements_sku_id_idx ON movements (sku_id)",
    "CREATE INDEX IF NOT EXISTS movements_reference_idx ON movements (reference)",
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        number TEXT NOT NULL UNIQUE,
        payload JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS production_orders (
        id UUID PRIMARY KEY,
        number TEXT NOT NULL UNIQUE,
        payload JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales_returns (
        id UUID PRIMARY KEY,
        number TEXT NOT NULL UNIQUE,
        payload JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cut_batches (
        id UUID PRIMARY KEY,
        reference TEXT NOT NULL,
        synced_at TIMESTAMPTZ,
        payload JSONB NOT NULL
    )
    "#,
    "CREATE SEQUENCE IF NOT EXISTS order_numbers",
    "CREATE SEQUENCE IF NOT EXISTS production_order_numbers",
    "CREATE SEQUENCE IF NOT EXISTS return_numbers",
];

/// Postgres-backed stock store.
///
/// Uses the SQLx connection pool, which is thread-safe (Arc + Send + Sync).
/// The sync `StockStore` impl bridges into async via the current tokio
/// runtime handle, so callers must run it off the async worker threads
/// (`tokio::task::spawn_blocking`).
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: Arc<PgPool>,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and return a store ready for [`Self::ensure_schema`].
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Create tables, indexes and number sequences if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(sku_id = %id), err)]
    pub async fn read_sku(&self, id: SkuId) -> Result<SkuRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, reference, color, size, physical, reserved, version, created_at
            FROM skus
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_sku", e))?;

        match row {
            Some(row) => SkuRow::from_row(&row)
                .map_err(|e| StoreError::Unavailable(format!("failed to deserialize sku row: {e}")))?
                .into_record(),
            None => Err(StoreError::NotFound(format!("sku {id}"))),
        }
    }

    pub async fn find_sku(&self, key: &VariantKey) -> Result<Option<SkuRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, reference, color, size, physical, reserved, version, created_at
            FROM skus
            WHERE reference = $1 AND color = $2 AND size = $3
            "#,
        )
        .bind(key.reference())
        .bind(key.color())
        .bind(key.size())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_sku", e))?;

        match row {
            Some(row) => {
                let record = SkuRow::from_row(&row)
                    .map_err(|e| StoreError::Unavailable(format!("failed to deserialize sku row: {e}")))?
                    .into_record()?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(variant = %key), err)]
    pub async fn find_or_create_sku(&self, key: &VariantKey) -> Result<SkuRecord, StoreError> {
        let candidate_id = SkuId::new();
        // The no-op DO UPDATE makes RETURNING yield the existing row when the
        // triple is already registered.
        let row = sqlx::query(
            r#"
            INSERT INTO skus (id, reference, color, size)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (reference, color, size)
            DO UPDATE SET reference = EXCLUDED.reference
            RETURNING id, reference, color, size, physical, reserved, version, created_at
            "#,
        )
        .bind(candidate_id.as_uuid())
        .bind(key.reference())
        .bind(key.color())
        .bind(key.size())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_or_create_sku", e))?;

        SkuRow::from_row(&row)
            .map_err(|e| StoreError::Unavailable(format!("failed to deserialize sku row: {e}")))?
            .into_record()
    }

    #[instrument(skip(self, balances), fields(sku_id = %id, expected = ?expected), err)]
    pub async fn upsert_sku(
        &self,
        id: SkuId,
        balances: Balances,
        expected: ExpectedVersion,
    ) -> Result<SkuRecord, StoreError> {
        let row = match expected {
            ExpectedVersion::Any => {
                sqlx::query(
                    r#"
                    UPDATE skus
                    SET physical = $2, reserved = $3, version = version + 1
                    WHERE id = $1
                    RETURNING id, reference, color, size, physical, reserved, version, created_at
                    "#,
                )
                .bind(id.as_uuid())
                .bind(balances.physical)
                .bind(balances.reserved)
                .fetch_optional(&*self.pool)
                .await
            }
            ExpectedVersion::Exact(version) => {
                sqlx::query(
                    r#"
                    UPDATE skus
                    SET physical = $2, reserved = $3, version = version + 1
                    WHERE id = $1 AND version = $4
                    RETURNING id, reference, color, size, physical, reserved, version, created_at
                    "#,
                )
                .bind(id.as_uuid())
                .bind(balances.physical)
                .bind(balances.reserved)
                .bind(version as i64)
                .fetch_optional(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("upsert_sku", e))?;

        if let Some(row) = row {
            return SkuRow::from_row(&row)
                .map_err(|e| StoreError::Unavailable(format!("failed to deserialize sku row: {e}")))?
                .into_record();
        }

        // Zero rows updated: either the sku is gone or the version moved.
        let current = sqlx::query("SELECT version FROM skus WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("upsert_sku", e))?;

        match current {
            Some(row) => {
                let found: i64 = row
                    .try_get("version")
                    .map_err(|e| StoreError::Unavailable(format!("failed to read version: {e}")))?;
                Err(StoreError::VersionConflict(format!(
                    "sku {id}: expected {expected:?}, found {found}"
                )))
            }
            None => Err(StoreError::NotFound(format!("sku {id}"))),
        }
    }

    pub async fn list_skus(&self) -> Result<Vec<SkuRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, reference, color, size, physical, reserved, version, created_at
            FROM skus
            ORDER BY reference, color, size
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_skus", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = SkuRow::from_row(&row)
                .map_err(|e| StoreError::Unavailable(format!("failed to deserialize sku row: {e}")))?
                .into_record()?;
            records.push(record);
        }
        Ok(records)
    }

    #[instrument(skip(self, movement), fields(movement_id = %movement.id, kind = %movement.kind), err)]
    pub async fn insert_movement(&self, movement: &Movement) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO movements (id, sku_id, kind, quantity, occurred_at, actor, note, reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.sku_id.as_uuid())
        .bind(movement.kind.as_str())
        .bind(movement.quantity)
        .bind(movement.occurred_at)
        .bind(&movement.actor)
        .bind(&movement.note)
        .bind(&movement.reference)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;
        Ok(())
    }

    pub async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
        let sku_param: Option<uuid::Uuid> = filter.sku_id.map(|id| *id.as_uuid());
        let kind_param: Option<&str> = filter.kind.map(|kind| kind.as_str());
        let reference_param: Option<&str> = filter.reference.as_deref();
        let limit_param: Option<i64> = filter.limit.map(|limit| limit as i64);

        let rows = sqlx::query(
            r#"
            SELECT id, sku_id, kind, quantity, occurred_at, actor, note, reference
            FROM movements
            WHERE ($1::uuid IS NULL OR sku_id = $1)
                AND ($2::text IS NULL OR kind = $2)
                AND ($3::text IS NULL OR reference = $3)
            ORDER BY position DESC
            LIMIT $4
            "#,
        )
        .bind(sku_param)
        .bind(kind_param)
        .bind(reference_param)
        .bind(limit_param)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        let mut movements = Vec::with_capacity(rows.len());
        for row in rows {
            let movement = MovementRow::from_row(&row)
                .map_err(|e| StoreError::Unavailable(format!("failed to deserialize movement row: {e}")))?
                .into_movement()?;
            movements.push(movement);
        }
        Ok(movements)
    }

    pub async fn insert_order(&self, order: &Order) -> Result<Order, StoreError> {
        let mut stored = order.clone();
        stored.number = self.next_number("order_numbers", "PED").await?;

        let payload = serde_json::to_value(&stored)
            .map_err(|e| StoreError::Unavailable(format!("order serialization failed: {e}")))?;
        sqlx::query("INSERT INTO orders (id, number, payload) VALUES ($1, $2, $3)")
            .bind(stored.id.as_uuid())
            .bind(&stored.number)
            .bind(&payload)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(stored)
    }

    pub async fn read_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let row = sqlx::query("SELECT payload FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_order", e))?;

        match row {
            Some(row) => payload_from_row(&row, "order"),
            None => Err(StoreError::NotFound(format!("order {id}"))),
        }
    }

    pub async fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let payload = serde_json::to_value(order)
            .map_err(|e| StoreError::Unavailable(format!("order serialization failed: {e}")))?;
        let result = sqlx::query("UPDATE orders SET payload = $2 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(&payload)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {}", order.id)));
        }
        Ok(())
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.list_payloads("SELECT payload FROM orders ORDER BY number", "order")
            .await
    }

    pub async fn insert_production_order(&self, order: &ProductionOrder) -> Result<ProductionOrder, StoreError> {
        let mut stored = order.clone();
        stored.number = self.next_number("production_order_numbers", "OP").await?;

        let payload = serde_json::to_value(&stored)
            .map_err(|e| StoreError::Unavailable(format!("production order serialization failed: {e}")))?;
        sqlx::query("INSERT INTO production_orders (id, number, payload) VALUES ($1, $2, $3)")
            .bind(stored.id.as_uuid())
            .bind(&stored.number)
            .bind(&payload)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_production_order", e))?;
        Ok(stored)
    }

    pub async fn read_production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder, StoreError> {
        let row = sqlx::query("SELECT payload FROM production_orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_production_order", e))?;

        match row {
            Some(row) => payload_from_row(&row, "production order"),
            None => Err(StoreError::NotFound(format!("production order {id}"))),
        }
    }

    pub async fn update_production_order(&self, order: &ProductionOrder) -> Result<(), StoreError> {
        let payload = serde_json::to_value(order)
            .map_err(|e| StoreError::Unavailable(format!("production order serialization failed: {e}")))?;
        let result = sqlx::query("UPDATE production_orders SET payload = $2 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(&payload)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_production_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("production order {}", order.id)));
        }
        Ok(())
    }

    pub async fn list_production_orders(&self) -> Result<Vec<ProductionOrder>, StoreError> {
        self.list_payloads("SELECT payload FROM production_orders ORDER BY number", "production order")
            .await
    }

    pub async fn insert_return(&self, sales_return: &SalesReturn) -> Result<SalesReturn, StoreError> {
        let mut stored = sales_return.clone();
        stored.number = self.next_number("return_numbers", "DEV").await?;

        let payload = serde_json::to_value(&stored)
            .map_err(|e| StoreError::Unavailable(format!("return serialization failed: {e}")))?;
        sqlx::query("INSERT INTO sales_returns (id, number, payload) VALUES ($1, $2, $3)")
            .bind(stored.id.as_uuid())
            .bind(&stored.number)
            .bind(&payload)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_return", e))?;
        Ok(stored)
    }

    pub async fn delete_return(&self, id: ReturnId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sales_returns WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_return", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("return {id}")));
        }
        Ok(())
    }

    pub async fn list_returns(&self) -> Result<Vec<SalesReturn>, StoreError> {
        self.list_payloads("SELECT payload FROM sales_returns ORDER BY number", "return")
            .await
    }

    pub async fn read_cut_batch(&self, id: CutBatchId) -> Result<CutBatch, StoreError> {
        let row = sqlx::query("SELECT payload, synced_at FROM cut_batches WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_cut_batch", e))?;

        match row {
            Some(row) => cut_batch_from_row(&row),
            None => Err(StoreError::NotFound(format!("cut batch {id}"))),
        }
    }

    pub async fn upsert_cut_batch(&self, batch: &CutBatch) -> Result<(), StoreError> {
        let payload = serde_json::to_value(batch)
            .map_err(|e| StoreError::Unavailable(format!("cut batch serialization failed: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO cut_batches (id, reference, synced_at, payload)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET reference = EXCLUDED.reference,
                          synced_at = EXCLUDED.synced_at,
                          payload = EXCLUDED.payload
            "#,
        )
        .bind(batch.id.as_uuid())
        .bind(&batch.reference)
        .bind(batch.synced_at)
        .bind(&payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_cut_batch", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(batch_id = %id, synced_at = ?synced_at), err)]
    pub async fn write_cut_batch_sync_marker(
        &self,
        id: CutBatchId,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE cut_batches SET synced_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(synced_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("write_cut_batch_sync_marker", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("cut batch {id}")));
        }
        Ok(())
    }

    pub async fn list_cut_batches(&self) -> Result<Vec<CutBatch>, StoreError> {
        let rows = sqlx::query("SELECT payload, synced_at FROM cut_batches ORDER BY reference")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_cut_batches", e))?;

        let mut batches = Vec::with_capacity(rows.len());
        for row in rows {
            batches.push(cut_batch_from_row(&row)?);
        }
        Ok(batches)
    }

    async fn next_number(&self, sequence: &str, prefix: &str) -> Result<String, StoreError> {
        let row = sqlx::query(&format!("SELECT nextval('{sequence}') AS seq"))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("next_number", e))?;
        let seq: i64 = row
            .try_get("seq")
            .map_err(|e| StoreError::Unavailable(format!("failed to read sequence value: {e}")))?;
        Ok(format!("{prefix}-{seq:04}"))
    }

    async fn list_payloads<T>(&self, query: &str, entity: &str) -> Result<Vec<T>, StoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows = sqlx::query(query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_payloads", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(payload_from_row(&row, entity)?);
        }
        Ok(items)
    }
}

fn payload_from_row<T>(row: &sqlx::postgres::PgRow, entity: &str) -> Result<T, StoreError>
where
    T: serde::de::DeserializeOwned,
{
    let payload: serde_json::Value = row
        .try_get("payload")
        .map_err(|e| StoreError::Unavailable(format!("failed to read {entity} payload: {e}")))?;
    serde_json::from_value(payload)
        .map_err(|e| StoreError::Unavailable(format!("corrupt {entity} payload: {e}")))
}

fn cut_batch_from_row(row: &sqlx::postgres::PgRow) -> Result<CutBatch, StoreError> {
    let mut batch: CutBatch = payload_from_row(row, "cut batch")?;
    // The marker column is authoritative; the payload copy may predate it.
    let synced_at: Option<DateTime<Utc>> = row
        .try_get("synced_at")
        .map_err(|e| StoreError::Unavailable(format!("failed to read sync marker: {e}")))?;
    batch.synced_at = synced_at;
    Ok(batch)
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    // Unique violation: a concurrent writer got there first.
                    "23505" => StoreError::VersionConflict(msg),
                    _ => StoreError::Unavailable(msg),
                }
            } else {
                StoreError::Unavailable(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("no row in {operation}")),
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

fn runtime_handle() -> Result<tokio::runtime::Handle, StoreError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Unavailable(
            "PostgresStockStore requires an async runtime (tokio). Call it from a spawn_blocking task inside the runtime.".to_string(),
        )
    })
}

// SQLx row types

#[derive(Debug)]
struct SkuRow {
    id: uuid::Uuid,
    reference: String,
    color: String,
    size: String,
    physical: i64,
    reserved: i64,
    version: i64,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for SkuRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(SkuRow {
            id: row.try_get("id")?,
            reference: row.try_get("reference")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
            physical: row.try_get("physical")?,
            reserved: row.try_get("reserved")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl SkuRow {
    fn into_record(self) -> Result<SkuRecord, StoreError> {
        let key = VariantKey::new(&self.reference, &self.color, &self.size)
            .map_err(|e| StoreError::Unavailable(format!("corrupt sku row {}: {e}", self.id)))?;
        Ok(SkuRecord {
            id: SkuId::from_uuid(self.id),
            key,
            balances: Balances::new(self.physical, self.reserved),
            version: self.version as u64,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug)]
struct MovementRow {
    id: uuid::Uuid,
    sku_id: uuid::Uuid,
    kind: String,
    quantity: i64,
    occurred_at: DateTime<Utc>,
    actor: String,
    note: Option<String>,
    reference: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for MovementRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            sku_id: row.try_get("sku_id")?,
            kind: row.try_get("kind")?,
            quantity: row.try_get("quantity")?,
            occurred_at: row.try_get("occurred_at")?,
            actor: row.try_get("actor")?,
            note: row.try_get("note")?,
            reference: row.try_get("reference")?,
        })
    }
}

impl MovementRow {
    fn into_movement(self) -> Result<Movement, StoreError> {
        let kind: MovementKind = self
            .kind
            .parse()
            .map_err(|e| StoreError::Unavailable(format!("corrupt movement row {}: {e}", self.id)))?;
        Ok(Movement {
            id: MovementId::from_uuid(self.id),
            sku_id: SkuId::from_uuid(self.sku_id),
            kind,
            quantity: self.quantity,
            occurred_at: self.occurred_at,
            actor: self.actor,
            note: self.note,
            reference: self.reference,
        })
    }
}

// Implement StockStore by bridging into the async methods through the
// current runtime.

impl StockStore for PostgresStockStore {
    fn read_sku(&self, id: SkuId) -> Result<SkuRecord, StoreError> {
        runtime_handle()?.block_on(self.read_sku(id))
    }

    fn find_sku(&self, key: &VariantKey) -> Result<Option<SkuRecord>, StoreError> {
        runtime_handle()?.block_on(self.find_sku(key))
    }

    fn find_or_create_sku(&self, key: &VariantKey) -> Result<SkuRecord, StoreError> {
        runtime_handle()?.block_on(self.find_or_create_sku(key))
    }

    fn upsert_sku(
        &self,
        id: SkuId,
        balances: Balances,
        expected: ExpectedVersion,
    ) -> Result<SkuRecord, StoreError> {
        runtime_handle()?.block_on(self.upsert_sku(id, balances, expected))
    }

    fn list_skus(&self) -> Result<Vec<SkuRecord>, StoreError> {
        runtime_handle()?.block_on(self.list_skus())
    }

    fn insert_movement(&self, movement: &Movement) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.insert_movement(movement))
    }

    fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
        runtime_handle()?.block_on(self.list_movements(filter))
    }

    fn insert_order(&self, order: &Order) -> Result<Order, StoreError> {
        runtime_handle()?.block_on(self.insert_order(order))
    }

    fn read_order(&self, id: OrderId) -> Result<Order, StoreError> {
        runtime_handle()?.block_on(self.read_order(id))
    }

    fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.update_order(order))
    }

    fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.delete_order(id))
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        runtime_handle()?.block_on(self.list_orders())
    }

    fn insert_production_order(&self, order: &ProductionOrder) -> Result<ProductionOrder, StoreError> {
        runtime_handle()?.block_on(self.insert_production_order(order))
    }

    fn read_production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder, StoreError> {
        runtime_handle()?.block_on(self.read_production_order(id))
    }

    fn update_production_order(&self, order: &ProductionOrder) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.update_production_order(order))
    }

    fn list_production_orders(&self) -> Result<Vec<ProductionOrder>, StoreError> {
        runtime_handle()?.block_on(self.list_production_orders())
    }

    fn insert_return(&self, sales_return: &SalesReturn) -> Result<SalesReturn, StoreError> {
        runtime_handle()?.block_on(self.insert_return(sales_return))
    }

    fn delete_return(&self, id: ReturnId) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.delete_return(id))
    }

    fn list_returns(&self) -> Result<Vec<SalesReturn>, StoreError> {
        runtime_handle()?.block_on(self.list_returns())
    }

    fn read_cut_batch(&self, id: CutBatchId) -> Result<CutBatch, StoreError> {
        runtime_handle()?.block_on(self.read_cut_batch(id))
    }

    fn upsert_cut_batch(&self, batch: &CutBatch) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.upsert_cut_batch(batch))
    }

    fn write_cut_batch_sync_marker(
        &self,
        id: CutBatchId,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.write_cut_batch_sync_marker(id, synced_at))
    }

    fn list_cut_batches(&self) -> Result<Vec<CutBatch>, StoreError> {
        runtime_handle()?.block_on(self.list_cut_batches())
    }
}
