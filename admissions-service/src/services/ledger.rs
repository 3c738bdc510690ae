//! Ledger Calculator. The financial state of a student is never the sum
//! kept on the student record: it is recomputed here, on demand, from the
//! course fee config and the append-only receipt history, so it cannot
//! drift from reality.

use std::sync::Arc;

use registrar_core::error::AppError;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    CourseFeeConfig, FeeComponent, FeeReceipt, Installment, PaymentPlan, StudentFinancialState,
};
use crate::services::store::{CourseFeeProvider, ReceiptStore, StudentStore};

/// Pure, deterministic ledger computation. Re-runnable at any time from the
/// receipt history.
pub fn compute_state(
    config: &CourseFeeConfig,
    plan: PaymentPlan,
    receipts: &[FeeReceipt],
) -> StudentFinancialState {
    let admission_paid: Decimal = receipts
        .iter()
        .filter(|r| r.component == FeeComponent::Admission)
        .map(|r| r.amount)
        .sum();

    // The listed admission fee is part of the course total; overpaying the
    // admission component raises the effective total rather than being lost.
    let effective_admission_fee = config.admission_fees.max(admission_paid);
    let total_due = config.total_fees - config.admission_fees + effective_admission_fee;
    let total_paid: Decimal = receipts.iter().map(|r| r.amount).sum();

    let installments = match plan {
        PaymentPlan::Monthly => installment_schedule(config),
        PaymentPlan::OneTime => Vec::new(),
    };

    StudentFinancialState {
        total_due,
        total_paid,
        // Signed; a UI may clamp for display but the true value stays.
        pending_balance: total_due - total_paid,
        effective_admission_fee,
        installments,
    }
}

/// Monthly installment schedule over `total_fees - registration_fees`. The
/// final installment absorbs the rounding remainder so the schedule sums to
/// the remaining amount exactly.
pub fn installment_schedule(config: &CourseFeeConfig) -> Vec<Installment> {
    let count = config.installment_count;
    if count == 0 {
        return Vec::new();
    }

    let remaining = config.total_fees - config.registration_fees;
    let per_installment = (remaining / Decimal::from(count)).ceil();

    let mut schedule = Vec::with_capacity(count as usize);
    let mut allocated = Decimal::ZERO;
    for ordinal in 1..count {
        schedule.push(Installment {
            ordinal,
            due_amount: per_installment,
        });
        allocated += per_installment;
    }
    schedule.push(Installment {
        ordinal: count,
        due_amount: remaining - allocated,
    });

    schedule
}

/// Fetches a student's fee config and receipt history and applies
/// [`compute_state`].
#[derive(Clone)]
pub struct LedgerService {
    students: Arc<dyn StudentStore>,
    receipts: Arc<dyn ReceiptStore>,
    courses: Arc<dyn CourseFeeProvider>,
}

impl LedgerService {
    pub fn new(
        students: Arc<dyn StudentStore>,
        receipts: Arc<dyn ReceiptStore>,
        courses: Arc<dyn CourseFeeProvider>,
    ) -> Self {
        Self {
            students,
            receipts,
            courses,
        }
    }

    /// Compute the authoritative financial state for a student.
    pub async fn compute_ledger(
        &self,
        student_id: Uuid,
    ) -> Result<StudentFinancialState, AppError> {
        let student = self
            .students
            .get_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

        let course_id = student.primary_course().ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Student has no course line attached"))
        })?;

        let config = self
            .courses
            .fee_config(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course fee config not found")))?;

        let receipts = self.receipts.receipts_for_student(student_id).await?;

        debug!(
            student_id = %student_id,
            receipt_count = receipts.len(),
            "Recomputing ledger from receipt history"
        );

        Ok(compute_state(&config, student.payment_plan, &receipts))
    }
}
