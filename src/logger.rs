//! Session logger: writes all log output to a single file.
//!
//! The file is truncated at each `init`, so it only ever holds the most
//! recent session. Nothing is written until `init` has been called, which
//! keeps library users free of files they did not ask for.
//!
//! Default location:
//!   Windows:  `%APPDATA%\rasterlayers\rasterlayers.log`
//!   Linux:    `~/.local/share/rasterlayers/rasterlayers.log`
//!   macOS:    `~/Library/Application Support/rasterlayers/rasterlayers.log`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Path of the current session log, once initialised.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

pub fn is_initialized() -> bool {
    LOG_FILE.get().is_some()
}

/// Write a raw line. I/O errors are swallowed.
pub fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Write a timestamped, level-tagged line.
pub fn write(level: &str, msg: &str) {
    if !is_initialized() {
        return;
    }
    write_line(&format!("[{}] [{}] {}", timestamp(), level, msg));
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write("INFO", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write("WARN", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write("ERROR", &format!($($arg)*));
    };
}

/// Open (or truncate) the session log and install a panic hook that mirrors
/// panics into it. Only the first call in a process takes effect.
pub fn init(path: Option<&Path>) -> std::io::Result<PathBuf> {
    if let Some(existing) = LOG_PATH.get() {
        return Ok(existing.clone());
    }
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)?;
    let _ = LOG_PATH.set(path.clone());
    let _ = LOG_FILE.set(Mutex::new(file));

    write_line(&format!(
        "=== rasterlayers {} session started {} ===",
        env!("CARGO_PKG_VERSION"),
        human_timestamp()
    ));
    write_line(&format!("Log file: {}", path.display()));
    write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        prev(info);
    }));

    Ok(path)
}

pub fn default_log_path() -> PathBuf {
    data_dir().join("rasterlayers").join("rasterlayers.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// HH:MM:SS within the current UTC day.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            format!("{:02}:{:02}:{:02}", (secs % 86400) / 3600, (secs % 3600) / 60, secs % 60)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_with_app_folder() {
        let path = default_log_path();
        assert!(path.ends_with(Path::new("rasterlayers").join("rasterlayers.log")));
    }

    #[test]
    fn timestamp_is_clock_shaped() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.matches(':').count(), 2);
    }
}
