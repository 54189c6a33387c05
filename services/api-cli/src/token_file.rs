//! Credential persistence between CLI runs
//!
//! The token file holds the bare credential followed by a newline. Writes use
//! an atomic temp-file + rename with 0600 permissions; signing out removes
//! the file.

use std::io::ErrorKind;
use std::path::Path;

use common::Credential;
use tracing::debug;

/// Read the credential saved at `path`. A missing or blank file is no credential.
pub fn load(path: &Path) -> common::Result<Option<Credential>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let credential = Credential::new(contents.trim());
            Ok((!credential.is_empty()).then_some(credential))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist `credential` to `path`, or remove the file when there is none.
pub async fn save(path: &Path, credential: Option<&Credential>) -> common::Result<()> {
    match credential {
        Some(credential) => write_atomic(path, credential).await,
        None => match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed token file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        },
    }
}

async fn write_atomic(path: &Path, credential: &Credential) -> common::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| common::Error::Config("token_file has no parent directory".into()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| common::Error::Config("token_file has no file name".into()))?;

    let tmp_path = dir.join(format!(".{file_name}.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, format!("{}\n", credential.expose())).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms).await?;
    }

    tokio::fs::rename(&tmp_path, path).await?;

    debug!(path = %path.display(), "persisted token file");
    Ok(())
}
