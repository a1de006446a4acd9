//! Bulk copy configuration.

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::messages::BulkInsertHints;

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Options controlling one bulk copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCopyOptions {
    /// Rows per batch (default: 5000).
    pub batch_size: usize,
    /// Send source values for identity columns instead of letting the server generate them.
    pub preserve_identity: bool,
    /// Check constraints while loading.
    pub check_constraints: bool,
    /// Fire insert triggers while loading.
    pub fire_triggers: bool,
    /// Keep NULLs instead of applying column defaults.
    pub keep_nulls: bool,
    /// Take a table lock for the duration of each batch.
    pub table_lock: bool,
    /// Round-trip timeout, enforced by the connection. `None` waits forever.
    pub operation_timeout: Option<Duration>,
}

impl Default for BulkCopyOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkCopyOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            preserve_identity: false,
            check_constraints: false,
            fire_triggers: false,
            keep_nulls: false,
            table_lock: false,
            operation_timeout: None,
        }
    }

    /// Set the batch size.
    ///
    /// # Example
    ///
    /// ```
    /// use mssql_bulk_rs::BulkCopyOptions;
    ///
    /// let options = BulkCopyOptions::new().with_batch_size(1000);
    /// assert!(options.validate().is_ok());
    /// ```
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_preserve_identity(mut self, preserve: bool) -> Self {
        self.preserve_identity = preserve;
        self
    }

    pub fn with_check_constraints(mut self, check: bool) -> Self {
        self.check_constraints = check;
        self
    }

    pub fn with_fire_triggers(mut self, fire: bool) -> Self {
        self.fire_triggers = fire;
        self
    }

    pub fn with_keep_nulls(mut self, keep: bool) -> Self {
        self.keep_nulls = keep;
        self
    }

    pub fn with_table_lock(mut self, lock: bool) -> Self {
        self.table_lock = lock;
        self
    }

    /// Set the round-trip timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Parse options from a string like "batchSize=1000;checkConstraints=true".
    ///
    /// Keys are case-insensitive and unrecognized keys are ignored.
    /// `operationTimeout` is in seconds; 0 means no timeout.
    pub fn parse(options: &str) -> Result<Self> {
        let mut parsed = Self::new();

        for pair in options.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::invalid_config(pair, "Expected format: key=value")
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key.to_ascii_lowercase().as_str() {
                "batchsize" => {
                    let size = value.parse::<i64>().map_err(|_| {
                        Error::invalid_config(key, format!("Invalid integer: {}", value))
                    })?;
                    if size <= 0 {
                        return Err(Error::invalid_config(key, "must be positive"));
                    }
                    parsed.batch_size = size as usize;
                }
                "preserveidentityvalues" | "keepidentity" => {
                    parsed.preserve_identity = parse_bool(key, value)?
                }
                "checkconstraints" => parsed.check_constraints = parse_bool(key, value)?,
                "firetriggers" => parsed.fire_triggers = parse_bool(key, value)?,
                "keepnulls" => parsed.keep_nulls = parse_bool(key, value)?,
                "tablelock" => parsed.table_lock = parse_bool(key, value)?,
                "operationtimeout" | "bulkcopytimeout" => {
                    let secs = value.parse::<u64>().map_err(|_| {
                        Error::invalid_config(key, format!("Invalid number of seconds: {}", value))
                    })?;
                    parsed.operation_timeout = (secs > 0).then(|| Duration::from_secs(secs));
                }
                _ => debug!(key, "ignoring unrecognized bulk copy option"),
            }
        }

        parsed.validate()?;
        Ok(parsed)
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid_config("batchSize", "must be positive"));
        }
        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_config("operationTimeout", "must be positive"));
        }
        Ok(())
    }

    /// INSERT BULK hints for these options.
    pub fn hints(&self) -> BulkInsertHints {
        BulkInsertHints {
            check_constraints: self.check_constraints,
            fire_triggers: self.fire_triggers,
            keep_nulls: self.keep_nulls,
            table_lock: self.table_lock,
            keep_identity: self.preserve_identity,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::invalid_config(
            key,
            format!("Invalid boolean: {}", value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BulkCopyOptions::default();
        assert_eq!(options.batch_size, 5000);
        assert!(!options.preserve_identity);
        assert_eq!(options.operation_timeout, None);
        assert_eq!(options.hints(), BulkInsertHints::default());
    }

    #[test]
    fn test_parse() {
        let options = BulkCopyOptions::parse(
            "BatchSize=1000; checkConstraints=true;FIRETRIGGERS=yes;operationTimeout=30;colour=blue",
        )
        .unwrap();
        assert_eq!(options.batch_size, 1000);
        assert!(options.check_constraints);
        assert!(options.fire_triggers);
        assert!(!options.table_lock);
        assert_eq!(options.operation_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_zero_timeout_means_none() {
        let options = BulkCopyOptions::parse("operationTimeout=0").unwrap();
        assert_eq!(options.operation_timeout, None);
    }

    #[test]
    fn test_parse_invalid_values() {
        for input in [
            "batchSize=0",
            "batchSize=-5",
            "batchSize=lots",
            "checkConstraints=maybe",
            "operationTimeout=-1",
            "tableLock",
        ] {
            assert!(
                matches!(
                    BulkCopyOptions::parse(input),
                    Err(Error::InvalidConfiguration { .. })
                ),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_validate() {
        assert!(BulkCopyOptions::new().with_batch_size(0).validate().is_err());
        assert!(BulkCopyOptions::new()
            .with_operation_timeout(Duration::ZERO)
            .validate()
            .is_err());
        let options = BulkCopyOptions::new()
            .with_preserve_identity(true)
            .with_table_lock(true);
        assert!(options.validate().is_ok());
        assert!(options.hints().keep_identity);
        assert!(options.hints().table_lock);
    }
}
