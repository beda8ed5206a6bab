use std::io::ErrorKind;
use std::path::Path;

use crate::error::StorageError;

/// Read a file. Returns `None` when it does not exist.
pub async fn read_object(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Read(format!("{}: {e}", path.display()))),
    }
}

/// Write a file atomically: the body goes to a sibling temp file which is
/// then renamed over the target. On Unix the file is readable by the owner
/// only.
pub async fn write_object(path: &Path, body: &[u8]) -> Result<(), StorageError> {
    let write_err = |e: std::io::Error| StorageError::Write(format!("{}: {e}", path.display()));

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    tokio::fs::write(tmp_path, body).await.map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(tmp_path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(write_err)?;
    }

    tokio::fs::rename(tmp_path, path).await.map_err(write_err)
}

/// Delete a file. Returns whether it existed.
pub async fn delete_object(path: &Path) -> Result<bool, StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::Delete(format!("{}: {e}", path.display()))),
    }
}
