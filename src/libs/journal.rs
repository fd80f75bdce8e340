use std::env;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{self, Write};

/// Append `log` to `logs/logs_<hour>-<day>-<month>-<year>.txt` when
/// `DEBUG_LOGS=true`. Never fails the caller.
pub fn save_log_to_file(log: &str) {
    if !is_debug_logs_enabled() {
        return;
    }

    if let Err(e) = create_dir_all("logs") {
        eprintln!("save_log_to_file mkdir error: {e}");
        return;
    }
    let now = chrono::Utc::now().format("%H-%d-%m-%Y").to_string();
    let file_name = format!("logs/logs_{now}.txt");
    let time_now = chrono::Utc::now().format("%H:%M:%S%.3f").to_string();

    if let Err(e) = append_line(&file_name, &format!("[{time_now}] {log}")) {
        eprintln!("save_log_to_file error: {e}");
    }
}

fn is_debug_logs_enabled() -> bool {
    env::var("DEBUG_LOGS")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn append_line(path: &str, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}
