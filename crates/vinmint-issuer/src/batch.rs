use crate::error::{IssuerError, Result};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vinmint_core::{Prefix, SequenceError, SequenceStore, Vin, VinFields, MAX_SEQUENCE};

/// Largest number of codes a single request may ask for.
pub const MAX_QUANTITY: u32 = 10_000;

/// A request for `quantity` new codes sharing one set of structural fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub quantity: u32,
    pub manufacturer_id: String,
    pub descriptor: String,
    pub model_year: i32,
    pub plant_code: String,
}

impl BatchRequest {
    /// Checks the quantity and every field without touching a store.
    pub fn validate(&self) -> Result<VinFields> {
        if !(1..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(IssuerError::InvalidQuantity(self.quantity));
        }
        Ok(VinFields::new(
            &self.manufacturer_id,
            &self.descriptor,
            self.model_year,
            &self.plant_code,
        )?)
    }
}

/// Codes produced by one completed batch, in allocation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub prefix: Prefix,
    pub codes: Vec<Vin>,
    pub start_sequence: u64,
    pub end_sequence: u64,
    pub quantity: u32,
    pub generated_at: Timestamp,
}

impl BatchResult {
    /// `true` when no other caller interleaved allocations on this prefix,
    /// i.e. `end_sequence - start_sequence + 1 == quantity`.
    pub fn is_contiguous(&self) -> bool {
        self.end_sequence - self.start_sequence + 1 == u64::from(self.quantity)
    }
}

/// What a batch managed to issue before it was interrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialBatch {
    pub prefix: Prefix,
    pub requested: u32,
    pub codes: Vec<Vin>,
}

impl PartialBatch {
    pub fn first_sequence(&self) -> Option<u64> {
        self.codes.first().map(Vin::sequence)
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.codes.last().map(Vin::sequence)
    }
}

/// Turns batch requests into freshly allocated, checksummed codes.
///
/// Allocation and assembly are interleaved one code at a time. Sequence
/// numbers within a batch are strictly increasing, but a concurrent batch
/// on the same prefix can interleave with this one; only uniqueness is
/// guaranteed across batches.
pub struct BatchAllocator<S: ?Sized = dyn SequenceStore> {
    store: Arc<S>,
    verify: bool,
}

impl<S: ?Sized> Clone for BatchAllocator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            verify: self.verify,
        }
    }
}

impl<S: SequenceStore + ?Sized> BatchAllocator<S> {
    /// Creates an allocator that re-verifies every assembled code.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            verify: true,
        }
    }

    /// Enables or disables the post-assembly checksum self-check.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Generates a batch with no deadline.
    pub async fn generate_batch(&self, request: &BatchRequest) -> Result<BatchResult> {
        self.run(request, None).await
    }

    /// Generates a batch, giving up on any allocation still pending at
    /// `deadline`.
    ///
    /// A timed-out allocation has an unknown outcome: the counter may have
    /// advanced. That number is skipped, never reused.
    pub async fn generate_batch_until(
        &self,
        request: &BatchRequest,
        deadline: Instant,
    ) -> Result<BatchResult> {
        self.run(request, Some(deadline)).await
    }

    async fn run(&self, request: &BatchRequest, deadline: Option<Instant>) -> Result<BatchResult> {
        let fields = request.validate()?;
        let prefix = fields.prefix();
        debug!(prefix = %prefix, quantity = request.quantity, "generating batch");

        let mut codes = Vec::with_capacity(request.quantity as usize);
        for _ in 0..request.quantity {
            match self.issue_one(&fields, &prefix, deadline).await {
                Ok(vin) => codes.push(vin),
                Err(cause) => return Err(interrupted(prefix, request.quantity, codes, cause)),
            }
        }

        let start_sequence = codes.first().map(Vin::sequence).unwrap_or_default();
        let end_sequence = codes.last().map(Vin::sequence).unwrap_or_default();
        let result = BatchResult {
            prefix,
            codes,
            start_sequence,
            end_sequence,
            quantity: request.quantity,
            generated_at: Timestamp::now(),
        };

        if !result.is_contiguous() {
            warn!(
                prefix = %result.prefix,
                start_sequence,
                end_sequence,
                quantity = result.quantity,
                "batch range interleaved with another caller"
            );
        }
        info!(
            prefix = %result.prefix,
            start_sequence,
            end_sequence,
            quantity = result.quantity,
            backend = %self.store.backend(),
            "generated batch"
        );
        Ok(result)
    }

    async fn issue_one(
        &self,
        fields: &VinFields,
        prefix: &Prefix,
        deadline: Option<Instant>,
    ) -> Result<Vin> {
        let allocation = self.store.allocate_next(prefix);
        let sequence = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, allocation)
                .await
                .map_err(|_| {
                    SequenceError::Timeout(format!(
                        "allocation for prefix {prefix} passed the caller deadline; \
                         the counter may have advanced"
                    ))
                })??,
            None => allocation.await?,
        };

        if sequence > MAX_SEQUENCE {
            return Err(IssuerError::SequenceExhausted {
                prefix: prefix.to_string(),
                sequence,
            });
        }

        let vin = if self.verify {
            fields.assemble_verified(sequence)?
        } else {
            fields.assemble(sequence)?
        };
        Ok(vin)
    }
}

fn interrupted(prefix: Prefix, requested: u32, codes: Vec<Vin>, cause: IssuerError) -> IssuerError {
    if let IssuerError::InvariantViolation(message) = &cause {
        error!(prefix = %prefix, issued = codes.len(), %message, "aborting batch on codec invariant violation");
    } else {
        warn!(
            prefix = %prefix,
            issued = codes.len(),
            requested,
            error = %cause,
            "batch interrupted; issued codes remain valid"
        );
    }

    IssuerError::PartialBatch {
        partial: Box::new(PartialBatch {
            prefix,
            requested,
            codes,
        }),
        cause: Box::new(cause),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use vinmint_core::sequence::Result as StoreResult;
    use vinmint_core::{BackendKind, SequenceStats, VinError};
    use vinmint_storage::InMemorySequenceStore;

    fn request(quantity: u32) -> BatchRequest {
        BatchRequest {
            quantity,
            manufacturer_id: "LZS".to_string(),
            descriptor: "HCKZS".to_string(),
            model_year: 2028,
            plant_code: "S".to_string(),
        }
    }

    fn allocator() -> BatchAllocator<InMemorySequenceStore> {
        BatchAllocator::new(Arc::new(InMemorySequenceStore::new()))
    }

    /// Fails every allocation after the first `healthy` ones.
    struct FlakyStore {
        inner: InMemorySequenceStore,
        healthy: u64,
        calls: AtomicU64,
    }

    #[async_trait]
    impl SequenceStore for FlakyStore {
        async fn allocate_next(&self, prefix: &Prefix) -> StoreResult<u64> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy {
                return Err(SequenceError::Unavailable("connection refused".to_string()));
            }
            self.inner.allocate_next(prefix).await
        }

        async fn read_current(&self, prefix: &Prefix) -> StoreResult<u64> {
            self.inner.read_current(prefix).await
        }

        async fn reset(&self, prefix: &Prefix, value: u64) -> StoreResult<()> {
            self.inner.reset(prefix, value).await
        }

        async fn statistics(&self) -> StoreResult<SequenceStats> {
            self.inner.statistics().await
        }

        fn backend(&self) -> BackendKind {
            BackendKind::Redis
        }
    }

    /// Never answers within a reasonable time.
    struct StalledStore;

    #[async_trait]
    impl SequenceStore for StalledStore {
        async fn allocate_next(&self, _prefix: &Prefix) -> StoreResult<u64> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(1)
        }

        async fn read_current(&self, _prefix: &Prefix) -> StoreResult<u64> {
            Ok(0)
        }

        async fn reset(&self, _prefix: &Prefix, _value: u64) -> StoreResult<()> {
            Ok(())
        }

        async fn statistics(&self) -> StoreResult<SequenceStats> {
            Ok(SequenceStats::default())
        }

        fn backend(&self) -> BackendKind {
            BackendKind::Redis
        }
    }

    #[tokio::test]
    async fn first_batch_starts_at_one() {
        let allocator = allocator();

        let result = allocator.generate_batch(&request(5)).await.unwrap();

        assert_eq!(result.start_sequence, 1);
        assert_eq!(result.end_sequence, 5);
        assert_eq!(result.quantity, 5);
        assert_eq!(result.prefix.as_str(), "LZSHCKZSWS");
        assert!(result.is_contiguous());
        let serials: Vec<&str> = result.codes.iter().map(|c| &c.as_str()[11..]).collect();
        assert_eq!(serials, ["000001", "000002", "000003", "000004", "000005"]);
        assert_eq!(result.codes[0].as_str(), "LZSHCKZS3WS000001");
    }

    #[tokio::test]
    async fn consecutive_batches_continue_the_counter() {
        let allocator = allocator();

        allocator.generate_batch(&request(3)).await.unwrap();
        let second = allocator.generate_batch(&request(2)).await.unwrap();

        assert_eq!(second.start_sequence, 4);
        assert_eq!(second.end_sequence, 5);
    }

    #[tokio::test]
    async fn invalid_quantity_burns_nothing() {
        let allocator = allocator();

        for quantity in [0, MAX_QUANTITY + 1] {
            let err = allocator.generate_batch(&request(quantity)).await.unwrap_err();
            assert!(matches!(err, IssuerError::InvalidQuantity(q) if q == quantity));
            assert!(err.is_validation());
        }

        let stats = allocator.store().statistics().await.unwrap();
        assert_eq!(stats.total_prefixes, 0);
    }

    #[tokio::test]
    async fn invalid_fields_burn_nothing() {
        let allocator = allocator();

        let mut bad_wmi = request(5);
        bad_wmi.manufacturer_id = "LZ".to_string();
        let err = allocator.generate_batch(&bad_wmi).await.unwrap_err();
        assert!(matches!(
            err,
            IssuerError::Validation(VinError::Length { field: "manufacturer id", .. })
        ));

        let mut bad_year = request(5);
        bad_year.model_year = 2031;
        let err = allocator.generate_batch(&bad_year).await.unwrap_err();
        assert!(matches!(
            err,
            IssuerError::Validation(VinError::UnsupportedYear(2031))
        ));

        let stats = allocator.store().statistics().await.unwrap();
        assert_eq!(stats.total_prefixes, 0);
    }

    #[tokio::test]
    async fn backend_failure_reports_partial_batch() {
        let store = Arc::new(FlakyStore {
            inner: InMemorySequenceStore::new(),
            healthy: 3,
            calls: AtomicU64::new(0),
        });
        let allocator = BatchAllocator::new(Arc::clone(&store));

        let err = allocator.generate_batch(&request(10)).await.unwrap_err();

        let partial = err.partial().expect("partial batch");
        assert_eq!(partial.requested, 10);
        assert_eq!(partial.codes.len(), 3);
        assert_eq!(partial.first_sequence(), Some(1));
        assert_eq!(partial.last_sequence(), Some(3));
        assert!(matches!(
            err.root_cause(),
            IssuerError::Store(SequenceError::Unavailable(_))
        ));
        // issued numbers are not reclaimed
        let prefix = Prefix::new("LZSHCKZSWS").unwrap();
        assert_eq!(store.read_current(&prefix).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn exhausted_prefix_stops_the_batch() {
        let allocator = allocator();
        let prefix = Prefix::new("LZSHCKZSWS").unwrap();
        allocator.store().reset(&prefix, 999_998).await.unwrap();

        let err = allocator.generate_batch(&request(3)).await.unwrap_err();

        let partial = err.partial().expect("partial batch");
        assert_eq!(partial.codes.len(), 1);
        assert_eq!(partial.first_sequence(), Some(999_999));
        assert!(matches!(
            err.root_cause(),
            IssuerError::SequenceExhausted {
                sequence: 1_000_000,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn deadline_turns_stalled_allocation_into_timeout() {
        let allocator = BatchAllocator::new(Arc::new(StalledStore));
        let deadline = Instant::now() + Duration::from_millis(50);

        let err = allocator
            .generate_batch_until(&request(2), deadline)
            .await
            .unwrap_err();

        assert_eq!(err.partial().map(|p| p.codes.len()), Some(0));
        assert!(matches!(
            err.root_cause(),
            IssuerError::Store(SequenceError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let store: Arc<dyn SequenceStore> = Arc::new(InMemorySequenceStore::new());
        let allocator: BatchAllocator = BatchAllocator::new(store).with_verification(false);

        let result = allocator.generate_batch(&request(2)).await.unwrap();
        assert_eq!(result.end_sequence, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_batches_never_share_a_code() {
        let allocator = allocator();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let allocator = allocator.clone();
                tokio::spawn(async move { allocator.generate_batch(&request(50)).await.unwrap() })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let result = handle.await.unwrap();
            let sequences: Vec<u64> = result.codes.iter().map(Vin::sequence).collect();
            assert!(sequences.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(result.start_sequence, sequences[0]);
            assert_eq!(result.end_sequence, sequences[sequences.len() - 1]);
            for code in result.codes {
                assert!(seen.insert(code), "duplicate code");
            }
        }
        assert_eq!(seen.len(), 300);
    }

    #[test]
    fn request_uses_camel_case_json() {
        let parsed: BatchRequest = serde_json::from_str(
            r#"{"quantity":5,"manufacturerId":"LZS","descriptor":"HCKZS","modelYear":2028,"plantCode":"S"}"#,
        )
        .unwrap();
        assert_eq!(parsed, request(5));
    }

    #[test]
    fn result_serializes_sequence_range() {
        let result = BatchResult {
            prefix: Prefix::new("LZSHCKZSWS").unwrap(),
            codes: vec![Vin::parse("LZSHCKZS3WS000001").unwrap()],
            start_sequence: 1,
            end_sequence: 1,
            quantity: 1,
            generated_at: Timestamp::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["codes"][0], "LZSHCKZS3WS000001");
        assert_eq!(json["startSequence"], 1);
        assert_eq!(json["endSequence"], 1);
        assert_eq!(json["prefix"], "LZSHCKZSWS");
    }
}
