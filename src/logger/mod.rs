//! Logger module
//!
//! Server lifecycle messages, warnings and errors, and per-request access
//! log lines. Output goes to files when configured, stdout/stderr otherwise.

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Reopen log files after external rotation
pub fn reopen() {
    if let Some(w) = writer::get() {
        match w.reopen() {
            Ok(()) => log_info("Log files reopened"),
            Err(e) => log_error(&format!("Failed to reopen log files: {e}")),
        }
    }
}

pub fn log_server_start(addr: &SocketAddr, stats_addr: Option<&SocketAddr>, config: &Config) {
    write_info("======================================");
    write_info("Static file server started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Serving files from: {}", config.fs.root.display()));
    write_info(&format!("Index files: {}", config.fs.index_names.join(", ")));
    write_info(&format!(
        "Directory listings: {}",
        if config.fs.generate_index_pages { "on" } else { "off" }
    ));
    write_info(&format!(
        "Byte ranges: {}",
        if config.fs.byte_range { "on" } else { "off" }
    ));
    if let Some(stats_addr) = stats_addr {
        write_info(&format!("Stats: http://{stats_addr}/debug/vars"));
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_api_error(message: &str) {
    write_error(&format!("[STATS ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    write_access(&entry.format(format));
}
