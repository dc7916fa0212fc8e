use std::sync::Arc;

use tracing::error;

use crate::api::Gateway;
use crate::errors::AppError;
use crate::models::Statistics;
use crate::state::DashboardStore;

/// Refreshes the statistics snapshot on demand.
#[derive(Clone)]
pub struct DashboardService {
    gateway: Arc<dyn Gateway>,
    store: DashboardStore,
}

impl DashboardService {
    pub fn new(gateway: Arc<dyn Gateway>, store: DashboardStore) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    /// Fetches fresh statistics. A result arriving after the store was reset
    /// is returned to the caller but not recorded.
    pub async fn refresh(&self) -> Result<Statistics, AppError> {
        let ticket = self.store.begin_refresh()?;

        match self.gateway.fetch_statistics().await {
            Ok(stats) => {
                self.store.complete_refresh(ticket, stats.clone());
                Ok(stats)
            }
            Err(e) => {
                error!("Statistics refresh failed: {e}");
                self.store.fail_refresh(ticket, e.to_string());
                Err(e)
            }
        }
    }
}
