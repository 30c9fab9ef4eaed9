//! Postgres-backed leave store

use super::LeaveStore;
use crate::error::AssistantError;
use crate::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const SELECT_BALANCE: &str = "SELECT balance FROM leaves WHERE employee = $1";

const UPSERT_BALANCE: &str = r#"
    INSERT INTO leaves (employee, balance) VALUES ($1, $2)
    ON CONFLICT (employee) DO UPDATE SET balance = EXCLUDED.balance
"#;

const CREATE_LEAVES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS leaves (
      employee TEXT PRIMARY KEY,
      balance INTEGER NOT NULL
    );
"#;

pub struct PgLeaveStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PgLeaveStore {
    /// Connect a small pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| {
                AssistantError::DatabaseError(format!("Failed to connect to Postgres: {}", e))
            })?;

        info!("Connected to Postgres leave store");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                debug!(sql = CREATE_LEAVES_TABLE.trim(), "Ensuring leaves table");
                sqlx::query(CREATE_LEAVES_TABLE).execute(&self.pool).await?;
                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                AssistantError::DatabaseError(format!(
                    "Failed to initialize leaves schema: {}",
                    e
                ))
            })?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl LeaveStore for PgLeaveStore {
    async fn balance(&self, employee: &str) -> Result<Option<i32>> {
        self.ensure_schema().await?;

        debug!(sql = SELECT_BALANCE, employee = %employee, "Querying leave balance");

        let balance = sqlx::query_scalar::<_, i32>(SELECT_BALANCE)
            .bind(employee)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AssistantError::DatabaseError(e.to_string()))?;

        Ok(balance)
    }

    async fn set_balance(&self, employee: &str, days: i32) -> Result<()> {
        self.ensure_schema().await?;

        debug!(sql = UPSERT_BALANCE.trim(), employee = %employee, days, "Upserting leave balance");

        sqlx::query(UPSERT_BALANCE)
            .bind(employee)
            .bind(days)
            .execute(&self.pool)
            .await
            .map_err(|e| AssistantError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
