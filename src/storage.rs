use crate::errors::AppError;
use crate::models::AppData;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// Loads the store, starting empty when the file is missing or unreadable.
pub async fn load_data(path: &Path) -> AppData {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no data file yet, starting empty");
            return AppData::default();
        }
        Err(err) => {
            warn!(path = %path.display(), "failed to read data file, starting empty: {err}");
            return AppData::default();
        }
    };

    match serde_json::from_slice::<AppData>(&bytes) {
        Ok(data) => {
            let entries: usize = data.users.values().map(Vec::len).sum();
            info!(
                path = %path.display(),
                users = data.users.len(),
                entries,
                "loaded symptom logs"
            );
            data
        }
        Err(err) => {
            warn!(path = %path.display(), "data file is not valid JSON, starting empty: {err}");
            AppData::default()
        }
    }
}

/// Writes to a sibling temp file first so a crash never leaves a torn file.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await.map_err(AppError::internal)?;
    fs::rename(&staging, path).await.map_err(AppError::internal)?;
    Ok(())
}
