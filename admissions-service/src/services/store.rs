//! Storage seams for the engine. Production runs against PostgreSQL
//! ([`super::Database`]); tests and embedded use run against
//! [`super::MemoryStore`].

use async_trait::async_trait;
use registrar_core::error::AppError;
use uuid::Uuid;

use crate::models::{CounterKey, CourseFeeConfig, FeeReceipt, StudentRecord};

/// Durable keyed monotonic counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically bump the counter and return the new value. Creates the
    /// counter at 1 on first use. This must be a single read-modify-write
    /// against the store: under N concurrent callers on one key the results
    /// are exactly `last+1 ..= last+N` with no duplicates.
    async fn increment(&self, key: &CounterKey) -> Result<i64, AppError>;

    /// Read the current value without consuming anything. Absent keys read
    /// as zero.
    async fn last_value(&self, key: &CounterKey) -> Result<i64, AppError>;

    /// Maintenance-only: drop the counter back to zero. Never called from
    /// request handling; see [`super::MaintenanceService`].
    async fn reset(&self, key: &CounterKey) -> Result<(), AppError>;
}

/// Append-only fee receipt history.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn insert_receipt(&self, receipt: &FeeReceipt) -> Result<(), AppError>;

    /// Receipts for one student, ordered by creation.
    async fn receipts_for_student(&self, student_id: Uuid) -> Result<Vec<FeeReceipt>, AppError>;

    /// Whether any receipt exists for a branch and cycle. Used by the
    /// counter-reset guard.
    async fn any_receipt_in_cycle(&self, branch_id: Uuid, cycle: i32) -> Result<bool, AppError>;
}

/// Student records.
#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn insert_student(&self, student: &StudentRecord) -> Result<(), AppError>;

    async fn get_student(&self, student_id: Uuid) -> Result<Option<StudentRecord>, AppError>;

    async fn update_student(&self, student: &StudentRecord) -> Result<(), AppError>;

    /// Whether any student in a branch and cycle already carries a
    /// registration or enrollment number. Used by the counter-reset guard.
    async fn any_identifier_in_cycle(&self, branch_id: Uuid, cycle: i32)
        -> Result<bool, AppError>;
}

/// Read-only course master data collaborator.
#[async_trait]
pub trait CourseFeeProvider: Send + Sync {
    async fn fee_config(&self, course_id: Uuid) -> Result<Option<CourseFeeConfig>, AppError>;
}

/// Opaque identity/credential collaborator; the engine only writes to it.
#[async_trait]
pub trait CredentialSink: Send + Sync {
    async fn store_credentials(
        &self,
        student_id: Uuid,
        username: &str,
        password: &str,
    ) -> Result<(), AppError>;
}
