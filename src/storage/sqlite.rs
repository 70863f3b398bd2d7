use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

use super::{EmotionSnapshot, Order, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::store::StoreSnapshot;

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// In-memory instance for tests.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: format!("Failed to run migrations: {}", e),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query {
            message: format!("Invalid timestamp '{}': {}", raw, e),
        })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_snapshot(&self, key: &str, snapshot: &StoreSnapshot) -> StorageResult<()> {
        let data = serde_json::to_string(snapshot)?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (key, data, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET data = ?2, updated_at = ?3
            "#,
        )
        .bind(key)
        .bind(data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_snapshot(&self, key: &str) -> StorageResult<Option<StoreSnapshot>> {
        let row = sqlx::query("SELECT data FROM snapshots WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn insert_order(&self, order: &Order) -> StorageResult<()> {
        let items = serde_json::to_string(&order.items)?;
        let emotion_vector = serde_json::to_string(&order.emotion_vector)?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, session_id, items, subtotal, discount_percent,
                 discount_amount, total, emotion_vector, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.session_id)
        .bind(items)
        .bind(order.subtotal)
        .bind(i64::from(order.discount_percent))
        .bind(order.discount_amount)
        .bind(order.total)
        .bind(emotion_vector)
        .bind(order.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_orders(&self, limit: u32) -> StorageResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, items, subtotal, discount_percent,
                   discount_amount, total, emotion_vector, created_at
            FROM orders
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items: String = row.get("items");
            let emotion_vector: String = row.get("emotion_vector");
            let created_at: String = row.get("created_at");
            let discount_percent: i64 = row.get("discount_percent");

            orders.push(Order {
                id: row.get("id"),
                session_id: row.get("session_id"),
                items: serde_json::from_str(&items)?,
                subtotal: row.get("subtotal"),
                discount_percent: discount_percent.clamp(0, 100) as u8,
                discount_amount: row.get("discount_amount"),
                total: row.get("total"),
                emotion_vector: serde_json::from_str(&emotion_vector)?,
                created_at: parse_timestamp(&created_at)?,
            });
        }

        Ok(orders)
    }

    async fn insert_emotion_snapshot(&self, snapshot: &EmotionSnapshot) -> StorageResult<()> {
        let emotion_vector = serde_json::to_string(&snapshot.emotion_vector)?;

        sqlx::query(
            r#"
            INSERT INTO emotion_snapshots
                (session_id, emotion_vector, cart_value, discount_applied, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&snapshot.session_id)
        .bind(emotion_vector)
        .bind(snapshot.cart_value)
        .bind(i64::from(snapshot.discount_applied))
        .bind(snapshot.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
