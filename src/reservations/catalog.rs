use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::BookingResult;
use crate::store::{CommandType, Store};

/// Closed set of command types a reservation may carry.
#[async_trait]
pub trait CommandCatalog: Send + Sync {
    async fn allowed_command_types(&self) -> BookingResult<HashSet<String>>;
}

/// Catalog backed by the `command_catalog` table.
#[derive(Debug, Clone)]
pub struct StoreCommandCatalog {
    store: Store,
}

impl StoreCommandCatalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list_commands(&self) -> BookingResult<Vec<CommandType>> {
        let commands = sqlx::query_as::<_, CommandType>(
            "SELECT command_type, description FROM command_catalog ORDER BY command_type",
        )
        .fetch_all(self.store.pool())
        .await?;
        Ok(commands)
    }
}

#[async_trait]
impl CommandCatalog for StoreCommandCatalog {
    async fn allowed_command_types(&self) -> BookingResult<HashSet<String>> {
        let types = sqlx::query_scalar::<_, String>("SELECT command_type FROM command_catalog")
            .fetch_all(self.store.pool())
            .await?;
        Ok(types.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_catalog_is_listed_in_order() {
        let catalog = StoreCommandCatalog::new(Store::in_memory().await.unwrap());

        let commands = catalog.list_commands().await.unwrap();
        let names: Vec<&str> = commands.iter().map(|c| c.command_type.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"PING"));

        let allowed = catalog.allowed_command_types().await.unwrap();
        assert_eq!(allowed.len(), commands.len());
        assert!(allowed.contains("DOWNLINK_TELEMETRY"));
    }
}
