use anyhow::Result;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "install-wizard";

/// Resolve deployment folder (absolute path)
pub fn resolve_deployment_folder() -> Result<PathBuf> {
    // Prefer the folder where the binary is running from
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return Ok(dir.to_path_buf());
        }
    }

    // Fallback: current working directory
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    Ok(cwd)
}

/// Per-user data directory, falling back to the deployment folder.
fn data_root() -> Result<PathBuf> {
    match dirs::data_local_dir() {
        Some(dir) => Ok(dir.join(APP_DIR)),
        None => resolve_deployment_folder(),
    }
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("Failed to create folder {:?}: {}", dir, e))?;
    Ok(dir)
}

/// Resolve log folder (absolute path). An explicit setting wins.
pub fn resolve_log_folder(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(dir) => ensure_dir(dir.to_path_buf()),
        None => ensure_dir(data_root()?.join("logs")),
    }
}

/// Resolve the folder file-backed sessions are written to.
pub fn resolve_session_folder(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(dir) => ensure_dir(dir.to_path_buf()),
        None => ensure_dir(data_root()?.join("sessions")),
    }
}
