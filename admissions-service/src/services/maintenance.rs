//! Counter-reset maintenance. Deliberately separate from the lifecycle
//! controller: nothing on the request path can reach a reset.

use std::sync::Arc;

use registrar_core::error::AppError;
use tracing::warn;

use crate::models::CounterKey;
use crate::services::store::{CounterStore, ReceiptStore, StudentStore};

#[derive(Clone)]
pub struct MaintenanceService {
    counters: Arc<dyn CounterStore>,
    receipts: Arc<dyn ReceiptStore>,
    students: Arc<dyn StudentStore>,
}

impl MaintenanceService {
    pub fn new(
        counters: Arc<dyn CounterStore>,
        receipts: Arc<dyn ReceiptStore>,
        students: Arc<dyn StudentStore>,
    ) -> Self {
        Self {
            counters,
            receipts,
            students,
        }
    }

    /// Reset one counter to zero. Refused once any receipt or assigned
    /// identifier exists for the affected branch and cycle: renumbering a
    /// cycle with history would let the allocator reissue numbers that
    /// already appear on receipts and registrations.
    pub async fn reset_counter(&self, key: &CounterKey) -> Result<(), AppError> {
        if self
            .receipts
            .any_receipt_in_cycle(key.branch_id, key.cycle)
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Refusing to reset {}: receipts already exist for this branch and cycle",
                key
            )));
        }

        if self
            .students
            .any_identifier_in_cycle(key.branch_id, key.cycle)
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Refusing to reset {}: students already carry identifiers for this branch and cycle",
                key
            )));
        }

        self.counters.reset(key).await?;

        warn!(key = %key, "Counter reset by maintenance operation");

        Ok(())
    }
}
