//! Receipt numbering
//!
//! Receipt numbers are globally unique and strictly monotonic. They come
//! from a named counter with a single atomic increment-and-return
//! capability; there is deliberately no way to read the counter without
//! advancing it, which rules out the read-then-write race by construction.
//! If the atomic primitive is unavailable the operation fails explicitly —
//! there is no non-atomic fallback.

use async_trait::async_trait;
use core_kernel::{DomainPort, PortError};
use std::sync::Arc;

/// Name of the receipt counter row
pub const RECEIPT_SEQUENCE: &str = "receipt";

/// Width of the zero-padded numeric part of a receipt number
const RECEIPT_WIDTH: usize = 5;

/// Prefix of every receipt number
const RECEIPT_PREFIX: &str = "C";

/// Port for named atomic counters
///
/// `next_value` must behave as one atomic read-increment-return on shared
/// state: N concurrent callers receive N distinct, strictly increasing
/// values with zero duplicates. The first call for a name returns 1.
#[async_trait]
pub trait SequencePort: DomainPort {
    /// Atomically increments the named counter and returns the new value
    async fn next_value(&self, name: &str) -> Result<i64, PortError>;
}

/// Issues formatted receipt numbers from the shared counter
#[derive(Clone)]
pub struct ReceiptNumbers {
    sequences: Arc<dyn SequencePort>,
}

impl ReceiptNumbers {
    /// Creates the issuer over a sequence port
    pub fn new(sequences: Arc<dyn SequencePort>) -> Self {
        Self { sequences }
    }

    /// Issues the next receipt number, e.g. `C00007`
    pub async fn next(&self) -> Result<String, PortError> {
        let value = self.sequences.next_value(RECEIPT_SEQUENCE).await?;
        Ok(Self::format(value))
    }

    /// Formats a counter value as a receipt number
    ///
    /// Values beyond the fixed width simply widen the number; they are
    /// never truncated or wrapped.
    pub fn format(value: i64) -> String {
        format!("{}{:0width$}", RECEIPT_PREFIX, value, width = RECEIPT_WIDTH)
    }
}

/// In-memory sequence counter for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Mock implementation of `SequencePort`
    ///
    /// A `Mutex` over the map makes each `next_value` atomic, matching the
    /// contract the SQL adapter gets from its single-statement upsert.
    #[derive(Debug, Default)]
    pub struct MockSequence {
        counters: Mutex<HashMap<String, i64>>,
        unavailable: AtomicBool,
    }

    impl MockSequence {
        /// Creates a mock with all counters at zero
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a mock with the named counter pre-set
        pub fn starting_at(name: &str, value: i64) -> Self {
            let mock = Self::new();
            mock.counters
                .lock()
                .expect("sequence mutex poisoned")
                .insert(name.to_string(), value);
            mock
        }

        /// Simulates the atomic primitive being unavailable
        pub fn make_unavailable(&self) {
            self.unavailable.store(true, Ordering::SeqCst);
        }
    }

    impl DomainPort for MockSequence {}

    #[async_trait]
    impl SequencePort for MockSequence {
        async fn next_value(&self, name: &str) -> Result<i64, PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::connection("atomic counter unavailable"));
            }
            let mut counters = self
                .counters
                .lock()
                .map_err(|_| PortError::internal("sequence mutex poisoned"))?;
            let value = counters.entry(name.to_string()).or_insert(0);
            *value += 1;
            Ok(*value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockSequence;
    use super::*;

    #[test]
    fn test_format_is_fixed_width() {
        assert_eq!(ReceiptNumbers::format(1), "C00001");
        assert_eq!(ReceiptNumbers::format(7), "C00007");
        assert_eq!(ReceiptNumbers::format(99999), "C99999");
        // Overflow widens instead of wrapping
        assert_eq!(ReceiptNumbers::format(100000), "C100000");
    }

    #[tokio::test]
    async fn test_first_issue_is_one() {
        let issuer = ReceiptNumbers::new(Arc::new(MockSequence::new()));
        assert_eq!(issuer.next().await.unwrap(), "C00001");
        assert_eq!(issuer.next().await.unwrap(), "C00002");
    }

    #[tokio::test]
    async fn test_resumes_from_existing_counter() {
        let issuer = ReceiptNumbers::new(Arc::new(MockSequence::starting_at(
            RECEIPT_SEQUENCE,
            5,
        )));
        assert_eq!(issuer.next().await.unwrap(), "C00006");
        assert_eq!(issuer.next().await.unwrap(), "C00007");
    }

    #[tokio::test]
    async fn test_unavailable_counter_fails_explicitly() {
        let sequences = Arc::new(MockSequence::new());
        sequences.make_unavailable();
        let issuer = ReceiptNumbers::new(sequences);

        let err = issuer.next().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_concurrent_issues_are_distinct_and_monotonic() {
        let issuer = ReceiptNumbers::new(Arc::new(MockSequence::new()));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let issuer = issuer.clone();
            handles.push(tokio::spawn(async move { issuer.next().await.unwrap() }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }

        let mut sorted = numbers.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 32, "receipt numbers must never collide");
        assert_eq!(sorted.first().unwrap(), "C00001");
        assert_eq!(sorted.last().unwrap(), "C00032");
    }
}
