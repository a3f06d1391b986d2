//! Snowflake ID Generator
//!
//! Twitter-style distributed unique ID generation. Identities cross the
//! service boundary as decimal strings and are parsed back with [`parse_id`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::AppError;

/// Custom epoch (2020-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1577836800000;

const SEQUENCE_BITS: u64 = 12;
const NODE_BITS: u64 = 5;
const MACHINE_BITS: u64 = 5;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_SHIFT: u64 = SEQUENCE_BITS + NODE_BITS + MACHINE_BITS;

/// Snowflake ID generator
///
/// The last issued id is kept in a single atomic, so concurrent callers
/// never observe the same id even when the clock stalls or steps back.
pub struct SnowflakeGenerator {
    machine_id: u64,
    node_id: u64,
    epoch: u64,
    last_id: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self::with_epoch(machine_id, node_id, DEFAULT_EPOCH)
    }

    /// Create a generator with a custom epoch in milliseconds.
    pub fn with_epoch(machine_id: u64, node_id: u64, epoch: u64) -> Self {
        Self {
            machine_id: machine_id & ((1 << MACHINE_BITS) - 1),
            node_id: node_id & ((1 << NODE_BITS) - 1),
            epoch,
            last_id: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let elapsed = self.current_timestamp().saturating_sub(self.epoch);
        let candidate = (elapsed << TIMESTAMP_SHIFT) | self.origin_bits();

        let mut last = self.last_id.load(Ordering::Acquire);
        loop {
            // Same or earlier millisecond: continue the sequence of the last id.
            // An exhausted sequence borrows the next millisecond.
            let next = if candidate > last {
                candidate
            } else if last & SEQUENCE_MASK < SEQUENCE_MASK {
                last + 1
            } else {
                (((last >> TIMESTAMP_SHIFT) + 1) << TIMESTAMP_SHIFT) | self.origin_bits()
            };
            match self
                .last_id
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next as i64,
                Err(actual) => last = actual,
            }
        }
    }

    /// Machine and node fields, already in position.
    fn origin_bits(&self) -> u64 {
        (self.machine_id << (SEQUENCE_BITS + NODE_BITS)) | (self.node_id << SEQUENCE_BITS)
    }

    /// Get current timestamp in milliseconds
    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch)
    }
}

/// Extract the timestamp (ms since UNIX epoch) from a snowflake ID.
pub fn extract_timestamp(snowflake: i64, epoch: u64) -> u64 {
    ((snowflake as u64) >> TIMESTAMP_SHIFT) + epoch
}

/// Sequence component of a snowflake ID.
pub fn extract_sequence(snowflake: i64) -> u64 {
    snowflake as u64 & SEQUENCE_MASK
}

/// Convert snowflake to string (for JSON serialization)
pub fn to_string(snowflake: i64) -> String {
    snowflake.to_string()
}

/// Parse an identity supplied by a caller.
///
/// Anything that is not a positive decimal integer is rejected before any
/// store access happens.
pub fn parse_id(s: &str) -> Result<i64, AppError> {
    match s.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidIdentity(format!(
            "'{}' is not a valid identifier",
            s
        ))),
    }
}

/// Parse a batch of identities, silently dropping malformed ones.
pub fn parse_ids_lenient(ids: &[String]) -> Vec<i64> {
    ids.iter().filter_map(|s| parse_id(s).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_unique() {
        let gen = SnowflakeGenerator::new(1, 1);
        let ids: HashSet<i64> = (0..10_000).map(|_| gen.generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_sequence_overflow_carries_into_timestamp() {
        let gen = SnowflakeGenerator::new(7, 3);
        let far_future = 1u64 << 40;
        let exhausted = (far_future << TIMESTAMP_SHIFT) | gen.origin_bits() | SEQUENCE_MASK;
        gen.last_id.store(exhausted, Ordering::Release);

        let id = gen.generate();
        assert_eq!(extract_sequence(id), 0);
        assert_eq!(extract_timestamp(id, 0), far_future + 1);
        assert_eq!((id as u64 & !SEQUENCE_MASK) & ((1 << TIMESTAMP_SHIFT) - 1), gen.origin_bits());
    }

    #[test]
    fn test_burst_keeps_origin_bits() {
        let gen = SnowflakeGenerator::new(31, 17);
        let ids: Vec<i64> = (0..3 * 4096).map(|_| gen.generate()).collect();

        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[1] > w[0]));
        for id in ids {
            assert_eq!((id as u64 >> SEQUENCE_BITS) & 0x3ff, (31 << NODE_BITS) | 17);
        }
    }

    #[test]
    fn test_generate_monotonic() {
        let gen = SnowflakeGenerator::new(3, 0);
        let a = gen.generate();
        let b = gen.generate();
        assert!(b > a);
    }

    #[test]
    fn test_extract_timestamp() {
        let gen = SnowflakeGenerator::new(1, 1);
        let id = gen.generate();
        let ts = extract_timestamp(id, DEFAULT_EPOCH);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        assert!(ts <= now);
        assert!(ts > now - 1000);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 7 ").unwrap(), 7);
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidIdentity(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::InvalidIdentity(_))));
        assert!(matches!(parse_id("0"), Err(AppError::InvalidIdentity(_))));
        assert!(matches!(parse_id(""), Err(AppError::InvalidIdentity(_))));
    }

    #[test]
    fn test_parse_ids_lenient_drops_garbage() {
        let ids = vec!["1".to_string(), "nope".to_string(), "3".to_string()];
        assert_eq!(parse_ids_lenient(&ids), vec![1, 3]);
    }
}
