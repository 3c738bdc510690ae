//! Services module for admissions-service.

pub mod database;
pub mod ledger;
pub mod lifecycle;
pub mod maintenance;
pub mod memory;
pub mod metrics;
pub mod sequence;
pub mod store;

pub use database::Database;
pub use ledger::LedgerService;
pub use lifecycle::LifecycleService;
pub use maintenance::MaintenanceService;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use sequence::{AllocatedId, SequenceAllocator};
pub use store::{CounterStore, CourseFeeProvider, CredentialSink, ReceiptStore, StudentStore};
