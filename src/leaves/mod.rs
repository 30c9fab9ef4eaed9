//! Leave balance storage
//!
//! Balances live in Postgres in production. The in-memory store carries the
//! sample employees used for offline runs.

use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod postgres;
pub use postgres::PgLeaveStore;

/// Trait for leave balance lookups
#[async_trait::async_trait]
pub trait LeaveStore: Send + Sync {
    /// Remaining annual leave days for an employee (exact name match)
    async fn balance(&self, employee: &str) -> Result<Option<i32>>;

    /// Insert or replace an employee's balance
    async fn set_balance(&self, employee: &str, days: i32) -> Result<()>;
}

/// In-memory leave store for development
pub struct InMemoryLeaveStore {
    balances: Arc<RwLock<HashMap<String, i32>>>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store pre-filled with the sample employees
    pub fn with_sample_data() -> Self {
        let balances = [("Alice", 15), ("Bob", 8), ("Charlie", 22), ("Diana", 5)]
            .into_iter()
            .map(|(name, days)| (name.to_string(), days))
            .collect();

        Self {
            balances: Arc::new(RwLock::new(balances)),
        }
    }
}

impl Default for InMemoryLeaveStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn balance(&self, employee: &str) -> Result<Option<i32>> {
        let balances = self.balances.read().await;
        Ok(balances.get(employee).copied())
    }

    async fn set_balance(&self, employee: &str, days: i32) -> Result<()> {
        let mut balances = self.balances.write().await;
        balances.insert(employee.to_string(), days);
        Ok(())
    }
}
