use crate::config::{
    ensure_config_dir, get_log_file_path, get_pid_file_path, is_daemon_running,
    process_is_alive, read_pid_file, DAEMON_TICK, RELOAD_INTERVAL,
};
use crate::engine::Expander;
use crate::error::{ExpanderError, Result};
use crate::listener::start_keyboard_listener;
use crate::models::SharedTable;
use crate::storage::SnippetStore;
use crate::watch::SnippetWatcher;

use log::{error, info, warn};
use std::fs::{self, File};
use std::io::Write;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Start the daemon process
pub fn start_daemon(store: &SnippetStore) -> Result<()> {
    // Check if daemon is already running
    if let Some(pid) = is_daemon_running()? {
        return Err(ExpanderError::DaemonAlreadyRunning(pid));
    }

    ensure_config_dir()?;
    store.ensure_exists()?;

    // Fork to background on Unix systems
    #[cfg(unix)]
    {
        use daemonize::Daemonize;

        let log_path = get_log_file_path();
        println!("Starting expander daemon in the background");
        println!("Logs: {}", log_path.display());

        let log_file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let daemonize = Daemonize::new()
            .working_directory("/tmp")
            .stdout(log_file.try_clone()?)
            .stderr(log_file);

        match daemonize.start() {
            Ok(_) => run_daemon_worker(store), // We're now in the daemon process
            Err(e) => Err(ExpanderError::Other(format!("Error starting daemon: {}", e))),
        }
    }

    // For non-Unix systems, just continue execution
    #[cfg(not(unix))]
    {
        println!("Starting expander daemon in the foreground (background not supported on this OS)");
        run_daemon_worker(store)
    }
}

/// The actual daemon worker: listen for delimiters until stopped
pub fn run_daemon_worker(store: &SnippetStore) -> Result<()> {
    ensure_config_dir()?;
    let pid_file = get_pid_file_path();
    let mut file = File::create(&pid_file)?;
    write!(file, "{}", process::id())?;
    drop(file);
    info!("Daemon worker started with PID {}", process::id());

    let result = run_until_stopped(store);

    if let Err(e) = fs::remove_file(&pid_file) {
        warn!("Error removing PID file: {}", e);
    }
    info!("Daemon worker stopped");
    result
}

fn run_until_stopped(store: &SnippetStore) -> Result<()> {
    let (snippets, source) = store.load_or_default();
    info!("Starting with {} snippets ({:?})", snippets.len(), source);
    let table = SharedTable::new(snippets);
    let expander = Arc::new(Expander::new(table.clone()));

    // Track running state
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Shutdown signal received");
            running.store(false, Ordering::SeqCst);
        })
        .map_err(|e| ExpanderError::Other(format!("Failed to install signal handler: {}", e)))?;
    }

    // rdev::listen never returns on most platforms, so the thread is not joined
    let listener = start_keyboard_listener(Arc::clone(&expander), Arc::clone(&running));

    let mut watcher = SnippetWatcher::new(store.clone());
    let mut last_check = Instant::now();
    while running.load(Ordering::SeqCst) {
        thread::sleep(DAEMON_TICK);

        if listener.is_finished() {
            error!("Keyboard listener exited; stopping daemon");
            running.store(false, Ordering::SeqCst);
            return Err(ExpanderError::Listener(
                "keyboard listener stopped unexpectedly".to_string(),
            ));
        }

        if last_check.elapsed() >= RELOAD_INTERVAL {
            watcher.check(&table);
            last_check = Instant::now();
        }
    }

    Ok(())
}

/// Stop the daemon if it's running
pub fn stop_daemon() -> Result<()> {
    let pid_file = get_pid_file_path();

    let pid = match read_pid_file(&pid_file) {
        Ok(Some(pid)) => pid,
        Ok(None) => return Err(ExpanderError::DaemonNotRunning),
        Err(e) => {
            // Unreadable or invalid PID file, remove it so start works again
            let _ = fs::remove_file(&pid_file);
            return Err(e);
        }
    };

    if !process_is_alive(pid) {
        println!("Process with PID {} is not running; removing stale PID file", pid);
        let _ = fs::remove_file(&pid_file);
        return Ok(());
    }

    if terminate(pid) {
        let _ = fs::remove_file(&pid_file);
        println!("Stopped expander daemon with PID {}", pid);
        Ok(())
    } else {
        Err(ExpanderError::Other(format!(
            "Failed to stop daemon with PID {}",
            pid
        )))
    }
}

#[cfg(unix)]
fn terminate(pid: u32) -> bool {
    use std::process::Command;

    // Try SIGTERM first so the worker removes its own PID file
    let _ = Command::new("kill").arg(pid.to_string()).status();
    if wait_for_exit(pid) {
        return true;
    }

    warn!("Daemon didn't terminate gracefully, using force kill");
    let _ = Command::new("kill").args(["-9", &pid.to_string()]).status();
    wait_for_exit(pid)
}

#[cfg(windows)]
fn terminate(pid: u32) -> bool {
    use std::process::Command;

    Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
fn terminate(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn wait_for_exit(pid: u32) -> bool {
    for _ in 0..10 {
        if !process_is_alive(pid) {
            return true;
        }
        thread::sleep(Duration::from_millis(100));
    }
    !process_is_alive(pid)
}

/// Check daemon status
pub fn daemon_status(store: &SnippetStore) -> Result<()> {
    match is_daemon_running()? {
        Some(pid) => println!("expander daemon is running with PID {}", pid),
        None => println!("expander daemon is not running"),
    }
    println!("Snippets file: {}", store.path().display());
    Ok(())
}
