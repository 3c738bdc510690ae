//! Sequence Allocator: turns atomic counter increments into formatted,
//! human-readable identifiers.

use std::sync::Arc;

use registrar_core::error::AppError;
use tracing::info;

use crate::models::{Branch, CounterKey, SequenceKind};
use crate::services::metrics::{ALLOCATIONS_TOTAL, ERRORS_TOTAL};
use crate::services::store::CounterStore;

/// Registration numbers start at a non-trivial visible floor.
const REGISTRATION_FLOOR: i64 = 1000;

/// A consumed counter value together with its formatted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedId {
    pub value: i64,
    pub formatted: String,
}

/// Issues collision-free identifiers scoped per branch, kind and cycle.
///
/// Allocation fails fast when the counter store is unreachable; there is no
/// fallback numbering and no automatic retry (a blind retry after a timeout
/// of unknown outcome could double-allocate — idempotency at the lifecycle
/// layer is the defense, not retries here).
#[derive(Clone)]
pub struct SequenceAllocator {
    counters: Arc<dyn CounterStore>,
}

impl SequenceAllocator {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Consume the next counter value and format it per kind.
    pub async fn allocate(
        &self,
        branch: &Branch,
        kind: SequenceKind,
        cycle: i32,
    ) -> Result<AllocatedId, AppError> {
        let key = CounterKey::new(branch.branch_id, kind, cycle);
        let value = match self.counters.increment(&key).await {
            Ok(value) => value,
            Err(e) => {
                ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
                return Err(e);
            }
        };
        let formatted = format_id(kind, &branch.code, cycle, value);

        ALLOCATIONS_TOTAL.with_label_values(&[kind.as_str()]).inc();
        info!(key = %key, value = value, id = %formatted, "Identifier allocated");

        Ok(AllocatedId { value, formatted })
    }

    /// Preview the next identifier without consuming it. A peeked value is
    /// not a reservation; a concurrent allocate may take it.
    pub async fn peek_next(
        &self,
        branch: &Branch,
        kind: SequenceKind,
        cycle: i32,
    ) -> Result<String, AppError> {
        let key = CounterKey::new(branch.branch_id, kind, cycle);
        let next = self.counters.last_value(&key).await? + 1;
        Ok(format_id(kind, &branch.code, cycle, next))
    }
}

/// Per-kind identifier formats.
pub fn format_id(kind: SequenceKind, branch_code: &str, cycle: i32, value: i64) -> String {
    match kind {
        SequenceKind::RegistrationNo => format!("{}-{}", cycle, REGISTRATION_FLOOR + value),
        SequenceKind::EnrollmentNo => format!("{}/{}/{:04}", branch_code, cycle, value),
        SequenceKind::ReceiptNo => format!("{:06}", value),
        SequenceKind::ExamSerialNo => format!("{}/{:04}", cycle, value),
    }
}
