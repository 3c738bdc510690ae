//! Common test utilities for admissions-service integration tests.

use std::sync::Arc;
use std::sync::Once;

use admissions_service::models::{
    Branch, CourseFeeConfig, CreateReceipt, PaymentDetail, PaymentPlan, SubmitAdmission,
};
use admissions_service::services::{
    LedgerService, LifecycleService, MaintenanceService, MemoryStore, SequenceAllocator,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,admissions_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const CYCLE: i32 = 2026;

/// The full engine wired over the in-memory store.
pub struct TestEngine {
    pub store: Arc<MemoryStore>,
    pub allocator: SequenceAllocator,
    pub lifecycle: LifecycleService,
    pub ledger: LedgerService,
    pub maintenance: MaintenanceService,
}

impl TestEngine {
    pub fn new() -> Self {
        init_tracing();

        let store = MemoryStore::new();
        let allocator = SequenceAllocator::new(store.clone());
        let lifecycle = LifecycleService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            allocator.clone(),
        );
        let ledger = LedgerService::new(store.clone(), store.clone(), store.clone());
        let maintenance = MaintenanceService::new(store.clone(), store.clone(), store.clone());

        Self {
            store,
            allocator,
            lifecycle,
            ledger,
            maintenance,
        }
    }
}

pub fn test_branch() -> Branch {
    Branch::new(Uuid::new_v4(), "HO")
}

pub fn fee_config(
    course_id: Uuid,
    total: i64,
    admission: i64,
    registration: i64,
    monthly: i64,
    installments: u32,
) -> CourseFeeConfig {
    CourseFeeConfig {
        course_id,
        total_fees: Decimal::from(total),
        admission_fees: Decimal::from(admission),
        registration_fees: Decimal::from(registration),
        monthly_fees: Decimal::from(monthly),
        installment_count: installments,
    }
}

pub fn admission_input(
    branch: &Branch,
    course_ids: Vec<Uuid>,
    plan: PaymentPlan,
) -> SubmitAdmission {
    SubmitAdmission {
        branch_id: branch.branch_id,
        branch_code: branch.code.clone(),
        cycle: CYCLE,
        name: "Asha Verma".to_string(),
        guardian_name: Some("R. Verma".to_string()),
        phone: Some("9800000000".to_string()),
        course_ids,
        payment_plan: plan,
    }
}

pub fn cash_receipt(amount: i64) -> CreateReceipt {
    CreateReceipt {
        amount: Decimal::from(amount),
        payment: PaymentDetail::Cash,
        paid_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        remarks: None,
    }
}

pub fn cheque_receipt(amount: i64) -> CreateReceipt {
    CreateReceipt {
        amount: Decimal::from(amount),
        payment: PaymentDetail::Cheque {
            bank: "State Bank".to_string(),
            number: "441202".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
        },
        paid_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        remarks: Some("admission fee".to_string()),
    }
}
