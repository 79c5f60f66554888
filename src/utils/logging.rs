//! Structured Logging with Sensitive Data Redaction
//!
//! Log lines never carry key material. Fields are redacted by name:
//! - Private keys and WIFs are fully redacted
//! - Addresses and script hashes are shortened
//! - Transaction ids are shortened

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable debug logging
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Disable debug logging
pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field (auto-redacts by key name)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        let redacted = redact_if_sensitive(key, &value);
        self.fields.push((key, redacted));
        self
    }

    /// Whether this entry would be written at the current debug setting
    pub fn is_enabled(&self) -> bool {
        self.level != LogLevel::Debug || is_debug_enabled()
    }

    /// Render without timestamp: `LEVEL [module] message | k=v ...`
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            line.push_str(" | ");
            line.push_str(&fields);
        }
        line
    }

    /// Write the entry to stderr
    pub fn log(self) {
        if !self.is_enabled() {
            return;
        }
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

/// Redact a value if the key suggests it's sensitive
fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    const FULLY_REDACTED: [&str; 8] = [
        "private", "secret", "wif", "key_hex", "signing_key", "password", "seed", "credential",
    ];
    if FULLY_REDACTED.iter().any(|k| key_lower.contains(k)) {
        return redact_value(value);
    }

    const ADDRESS_KEYS: [&str; 4] = ["address", "recipient", "sender", "script_hash"];
    if key_lower == "to" || ADDRESS_KEYS.iter().any(|k| key_lower.contains(k)) {
        return redact_address(value);
    }

    if key_lower.contains("txid") || key_lower.contains("hash") {
        return redact_hash(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// Show the first 6 and last 4 characters of an address
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= 13 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }
    format!("{}...{}", &trimmed[..6], &trimmed[trimmed.len() - 4..])
}

/// Show the first 10 and last 6 characters of a hash
fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }
    format!("{}...{}", &trimmed[..10], &trimmed[trimmed.len() - 6..])
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::__log_at!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::__log_at!(Warn, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_value("L1QqQJnpBwbs"), "[REDACTED:12chars]");
    }

    #[test]
    fn test_redact_address() {
        let redacted = redact_address("ALq7AWrhAueN6mJNqk6FHJjnsEoPRytLdW");
        assert_eq!(redacted, "ALq7AW...tLdW");
        assert_eq!(redact_address("short"), "[REDACTED:5chars]");
    }

    #[test]
    fn test_redact_hash() {
        let txid = "0c24a8a1a7e9b827cc4b8f8ce0d19d64a1c7b0f5b8e0a1d1f6b6e8c8ab01cd23";
        let redacted = redact_hash(txid);
        assert!(redacted.starts_with("0c24a8a1a7"));
        assert!(redacted.ends_with("01cd23"));
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert!(redact_if_sensitive("wif", "L1QqQJnpBwbsPGAuutuzPTac").contains("REDACTED"));
        assert!(redact_if_sensitive("private_key", "7d128a6d").contains("REDACTED"));
        assert!(redact_if_sensitive("recipient", "ALq7AWrhAueN6mJNqk6FHJjnsEoPRytLdW").contains("..."));
        assert_eq!(redact_if_sensitive("amount", "3"), "3");
        assert_eq!(redact_if_sensitive("total", "3"), "3");
        assert!(redact_if_sensitive("to", "ALq7AWrhAueN6mJNqk6FHJjnsEoPRytLdW").contains("..."));
    }

    #[test]
    fn test_render() {
        let entry = LogEntry::new(LogLevel::Info, "pipeline", "Broadcast accepted")
            .field("inputs", 2)
            .field("wif", "L1QqQJnpBwbsPGAuutuzPTac");
        assert_eq!(
            entry.render(),
            "INFO [pipeline] Broadcast accepted | inputs=2 wif=[REDACTED:24chars]"
        );
    }

    #[test]
    fn test_debug_entries_follow_toggle() {
        let warn = LogEntry::new(LogLevel::Warn, "test", "always");
        let debug = LogEntry::new(LogLevel::Debug, "test", "toggled");

        enable_debug();
        assert!(is_debug_enabled());
        assert!(debug.is_enabled());

        disable_debug();
        assert!(!debug.is_enabled());
        assert!(warn.is_enabled());
    }
}
