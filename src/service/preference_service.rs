use std::sync::Arc;

use tracing::debug;

use crate::db::KeyValueStore;
use crate::errors::AppError;

pub const ACTIVE_TAB_KEY: &str = "activeTab";
pub const DEFAULT_TAB: &str = "chat";

/// Remembers which navigation tab was open so it can be restored on the next load.
#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn active_tab(&self) -> Result<String, AppError> {
        Ok(self
            .store
            .get(ACTIVE_TAB_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_TAB.to_string()))
    }

    pub async fn set_active_tab(&self, tab: &str) -> Result<String, AppError> {
        let tab = tab.trim();
        if tab.is_empty() {
            return Err(AppError::EmptyField { field_name: "tab".to_string() });
        }
        self.store.set(ACTIVE_TAB_KEY, tab).await?;
        debug!("Active tab set to {tab}");
        Ok(tab.to_string())
    }
}
