use crate::config::Config;
use crate::errors::AppError;
use crate::models::AppData;
use crate::storage::persist_data;
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(config: Config, data: AppData) -> Self {
        Self {
            config: Arc::new(config),
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.config.data_path
    }

    /// Applies `mutate` to a copy of the store, writes the copy to disk, and
    /// only then swaps it in. A failed mutation or write leaves the store
    /// untouched.
    pub async fn update<R>(
        &self,
        mutate: impl FnOnce(&mut AppData) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut data = self.data.lock().await;
        let mut draft = data.clone();
        let result = mutate(&mut draft)?;
        persist_data(self.data_path(), &draft).await?;
        *data = draft;
        Ok(result)
    }
}
