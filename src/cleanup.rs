//! Process-wide browser teardown
//!
//! Kills every Chrome process by name. Only the top-level driver calls this,
//! once, after the whole batch has finished.

use tokio::process::Command;
use tracing::{info, warn};

const WINDOWS_ARGS: &[&str] = &["/F", "/IM", "chrome.exe"];
const MACOS_ARGS: &[&str] = &["Chrome"];
const UNIX_ARGS: &[&str] = &["chrome"];

/// Platform kill command as (program, args)
pub fn kill_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "windows") {
        ("taskkill", WINDOWS_ARGS)
    } else if cfg!(target_os = "macos") {
        ("pkill", MACOS_ARGS)
    } else {
        ("pkill", UNIX_ARGS)
    }
}

/// Kill lingering browser processes; failures are logged, never returned
pub async fn kill_browser_processes() {
    let (program, args) = kill_command();

    match Command::new(program).args(args).status().await {
        Ok(status) if status.success() => info!("Cleaned up Chrome processes"),
        Ok(status) => warn!(%status, "Chrome cleanup found nothing to kill or failed"),
        Err(e) => warn!(error = %e, program, "Failed to kill Chrome processes"),
    }
}
