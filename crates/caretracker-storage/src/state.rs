use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;

/// Load a JSON state file.
pub async fn load_state<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound {
                key: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Save a JSON state file through a sibling temp file and a rename.
pub async fn save_state<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
