//! Structured Logging with Sensitive Data Redaction
//!
//! Log entries are emitted as `tracing` events. Field values are redacted
//! by key before they leave the crate:
//! - Seeds, mnemonics, passphrases, private and blinding keys, chain codes
//! - Addresses and scripts (partial redaction)
//! - Transaction ids (shortened)

use std::fmt;

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
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
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

    /// Add a field to the log entry (auto-redacts sensitive data)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value_str = value.to_string();
        let redacted = redact_if_sensitive(key, &value_str);
        self.fields.push((key, redacted));
        self
    }

    /// Add a field with explicit redaction
    pub fn redacted_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let redacted = redact_value(&value.to_string());
        self.fields.push((key, redacted));
        self
    }

    fn fields_string(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Emit the entry as a tracing event
    pub fn log(self) {
        let fields = self.fields_string();
        let module = self.module;
        let message = self.message.as_str();

        match self.level {
            LogLevel::Debug => tracing::debug!(module, fields = %fields, "{}", message),
            LogLevel::Info => tracing::info!(module, fields = %fields, "{}", message),
            LogLevel::Warn => tracing::warn!(module, fields = %fields, "{}", message),
            LogLevel::Error => tracing::error!(module, fields = %fields, "{}", message),
        }
    }
}

/// Redact a value if the key suggests it's sensitive
fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    // Keys that should always be fully redacted
    let fully_redacted_keys = [
        "private", "secret", "seed", "mnemonic", "phrase", "passphrase", "blinding",
        "chain_code", "xpriv", "wif",
    ];

    if fully_redacted_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_value(value);
    }

    // Keys that should be partially redacted (addresses, scripts)
    let address_keys = ["address", "script"];
    if address_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_address(value);
    }

    // Keys with transaction hashes - show partial
    let hash_keys = ["txid", "tx_hash", "hash"];
    if hash_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_hash(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
fn redact_value(value: &str) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }

    let len = value.len();
    if len <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", len)
    }
}

/// Partially redact an address (show first 6 and last 4 chars)
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = 6;
    let suffix_len = 4;

    if trimmed.len() <= prefix_len + suffix_len + 3 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }

    let prefix = &trimmed[..prefix_len];
    let suffix = &trimmed[trimmed.len() - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Partially redact a hash (show first 10 and last 6 chars)
fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }

    let prefix = &trimmed[..10];
    let suffix = &trimmed[trimmed.len() - 6..];

    format!("{}...{}", prefix, suffix)
}

/// Convenience macro for debug logging
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for info logging
#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for warning logging
#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for error logging
#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}
