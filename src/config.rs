use crate::error::{ExpanderError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR_NAME: &str = ".expander";
pub const CONFIG_DIR_ENV: &str = "EXPANDER_HOME";
pub const SNIPPETS_FILENAME: &str = "snippets";
pub const PID_FILENAME: &str = "expander.pid";
pub const LOG_FILENAME: &str = "expander.log";

/// How often the daemon checks the snippets file for changes
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(1);
/// Sleep between iterations of the daemon's main loop
pub const DAEMON_TICK: Duration = Duration::from_millis(100);
pub const LISTENER_MAX_RETRIES: u32 = 5;
pub const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Get the expander configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    env::var("HOME")
        .map(|home| PathBuf::from(home).join(CONFIG_DIR_NAME))
        .unwrap_or_else(|_| PathBuf::from(CONFIG_DIR_NAME))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }
    Ok(config_dir)
}

/// Get the path to the snippets file
pub fn get_snippets_file_path() -> PathBuf {
    get_config_dir().join(SNIPPETS_FILENAME)
}

/// Get the path to the PID file
pub fn get_pid_file_path() -> PathBuf {
    get_config_dir().join(PID_FILENAME)
}

/// Get the path to the daemon log file
pub fn get_log_file_path() -> PathBuf {
    get_config_dir().join(LOG_FILENAME)
}

/// Read the PID recorded in a PID file, if the file exists
pub fn read_pid_file(path: &Path) -> Result<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    contents
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ExpanderError::InvalidPid)
}

/// Check if daemon is running
pub fn is_daemon_running() -> Result<Option<u32>> {
    let pid_file = get_pid_file_path();

    match read_pid_file(&pid_file) {
        Ok(Some(pid)) if process_is_alive(pid) => Ok(Some(pid)),
        Ok(Some(_)) => Ok(None),
        Ok(None) => Ok(None),
        Err(ExpanderError::InvalidPid) => {
            // Invalid PID, treat as not running and clean up
            let _ = fs::remove_file(&pid_file);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Check whether a process with the given PID exists
pub fn process_is_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    {
        std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }

    // Assume it's running if a PID file exists
    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
        true
    }
}
