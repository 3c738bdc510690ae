//! Student Lifecycle Controller. Orchestrates admission, fee collection and
//! registration; the only component that advances a student's stage.
//!
//! There is no cross-step transaction: identifier allocation, receipt
//! persistence and stage updates are each individually durable, and
//! idempotency compensates for partial completion.

use std::sync::Arc;

use chrono::Utc;
use registrar_core::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    Branch, CreateReceipt, Credentials, FeeComponent, FeeReceipt, LifecycleStage,
    RegistrationOutcome, SequenceKind, StudentRecord, SubmitAdmission,
};
use crate::services::metrics::{FEE_AMOUNT_TOTAL, RECEIPTS_TOTAL, REGISTRATIONS_TOTAL};
use crate::services::sequence::SequenceAllocator;
use crate::services::store::{CredentialSink, ReceiptStore, StudentStore};

#[derive(Clone)]
pub struct LifecycleService {
    students: Arc<dyn StudentStore>,
    receipts: Arc<dyn ReceiptStore>,
    credentials: Arc<dyn CredentialSink>,
    allocator: SequenceAllocator,
}

impl LifecycleService {
    pub fn new(
        students: Arc<dyn StudentStore>,
        receipts: Arc<dyn ReceiptStore>,
        credentials: Arc<dyn CredentialSink>,
        allocator: SequenceAllocator,
    ) -> Self {
        Self {
            students,
            receipts,
            credentials,
            allocator,
        }
    }

    /// Submit an admission draft. Allocates the enrollment number and
    /// persists the record at `Draft`.
    pub async fn submit_admission(
        &self,
        input: SubmitAdmission,
    ) -> Result<StudentRecord, AppError> {
        // Validate before touching any counter so a rejected draft wastes
        // no value.
        input.validate()?;

        let branch = Branch::new(input.branch_id, input.branch_code.clone());
        let enrollment = self
            .allocator
            .allocate(&branch, SequenceKind::EnrollmentNo, input.cycle)
            .await?;

        let student = StudentRecord {
            student_id: Uuid::new_v4(),
            branch_id: input.branch_id,
            branch_code: input.branch_code,
            cycle: input.cycle,
            name: input.name,
            guardian_name: input.guardian_name,
            phone: input.phone,
            course_ids: input.course_ids,
            payment_plan: input.payment_plan,
            stage: LifecycleStage::Draft,
            active: false,
            enrollment_no: Some(enrollment.formatted),
            registration_no: None,
            created_utc: Utc::now(),
            registered_utc: None,
        };

        self.students.insert_student(&student).await?;

        info!(
            student_id = %student.student_id,
            enrollment_no = %student.enrollment_no.as_deref().unwrap_or(""),
            "Admission draft submitted"
        );

        Ok(student)
    }

    /// "Pay later": park the draft until the admission fee is collected.
    pub async fn choose_pay_later(&self, student_id: Uuid) -> Result<StudentRecord, AppError> {
        let mut student = self.require_student(student_id).await?;

        if student.stage != LifecycleStage::Draft {
            return Err(AppError::InvalidTransition(anyhow::anyhow!(
                "Cannot defer admission fee from stage '{}'",
                student.stage
            )));
        }
        if student.course_ids.is_empty() {
            return Err(AppError::InvalidTransition(anyhow::anyhow!(
                "At least one course line must be attached before deferring the admission fee"
            )));
        }

        student.stage = LifecycleStage::AdmissionFeePending;
        self.students.update_student(&student).await?;

        info!(student_id = %student_id, "Admission fee deferred");

        Ok(student)
    }

    /// Collect the admission fee, either "pay now" from `Draft` or the
    /// deferred collection from `AdmissionFeePending`.
    pub async fn pay_admission_fee(
        &self,
        student_id: Uuid,
        input: CreateReceipt,
    ) -> Result<(FeeReceipt, StudentRecord), AppError> {
        let mut student = self.require_student(student_id).await?;

        match student.stage {
            LifecycleStage::Draft | LifecycleStage::AdmissionFeePending => {}
            _ => {
                return Err(AppError::InvalidTransition(anyhow::anyhow!(
                    "Cannot collect admission fee at stage '{}'",
                    student.stage
                )))
            }
        }

        let receipt = self
            .record_receipt(&student, FeeComponent::Admission, input)
            .await?;

        // The receipt is the source of truth. If this stage update fails
        // the receipt stands and reconcile_stage repairs the record.
        student.stage = LifecycleStage::AdmissionFeePaid;
        self.students.update_student(&student).await?;

        Ok((receipt, student))
    }

    /// Collect a course-fee payment. Valid once the admission fee is paid;
    /// does not change the lifecycle stage.
    pub async fn collect_course_fee(
        &self,
        student_id: Uuid,
        input: CreateReceipt,
    ) -> Result<FeeReceipt, AppError> {
        let student = self.require_student(student_id).await?;

        match student.stage {
            LifecycleStage::AdmissionFeePaid
            | LifecycleStage::RegistrationPending
            | LifecycleStage::Registered => {}
            _ => {
                return Err(AppError::InvalidTransition(anyhow::anyhow!(
                    "Cannot collect course fees at stage '{}'",
                    student.stage
                )))
            }
        }

        self.record_receipt(&student, FeeComponent::Course, input)
            .await
    }

    /// Confirm registration. Idempotent: a student who already carries a
    /// registration number gets the same number back and nothing is
    /// allocated, so a retry after a lost response is safe.
    pub async fn confirm_registration(
        &self,
        student_id: Uuid,
        credentials: &Credentials,
    ) -> Result<RegistrationOutcome, AppError> {
        credentials.validate()?;

        let mut student = self.require_student(student_id).await?;

        if let Some(existing) = student.registration_no.clone() {
            info!(
                student_id = %student_id,
                registration_no = %existing,
                "Registration already confirmed, returning existing number"
            );
            return Ok(RegistrationOutcome {
                registration_no: existing,
                stage: student.stage,
                newly_allocated: false,
            });
        }

        if student.stage != LifecycleStage::AdmissionFeePaid {
            return Err(AppError::InvalidTransition(anyhow::anyhow!(
                "Cannot confirm registration at stage '{}'",
                student.stage
            )));
        }

        student.stage = LifecycleStage::RegistrationPending;
        self.students.update_student(&student).await?;

        self.credentials
            .store_credentials(student_id, &credentials.username, &credentials.password)
            .await?;

        let branch = Branch::new(student.branch_id, student.branch_code.clone());
        let allocated = self
            .allocator
            .allocate(&branch, SequenceKind::RegistrationNo, student.cycle)
            .await?;

        student.registration_no = Some(allocated.formatted.clone());
        student.stage = LifecycleStage::Registered;
        student.active = true;
        student.registered_utc = Some(Utc::now());
        self.students.update_student(&student).await?;

        REGISTRATIONS_TOTAL
            .with_label_values(&[student.branch_code.as_str()])
            .inc();
        info!(
            student_id = %student_id,
            registration_no = %allocated.formatted,
            "Registration confirmed"
        );

        Ok(RegistrationOutcome {
            registration_no: allocated.formatted,
            stage: LifecycleStage::Registered,
            newly_allocated: true,
        })
    }

    /// Flip the orthogonal active flag of a registered student. Never
    /// changes the lifecycle stage.
    pub async fn set_active(
        &self,
        student_id: Uuid,
        active: bool,
    ) -> Result<StudentRecord, AppError> {
        let mut student = self.require_student(student_id).await?;

        if student.stage != LifecycleStage::Registered {
            return Err(AppError::InvalidTransition(anyhow::anyhow!(
                "Only registered students can be toggled active/inactive (stage '{}')",
                student.stage
            )));
        }

        student.active = active;
        self.students.update_student(&student).await?;

        Ok(student)
    }

    /// Cancel a student. Terminal; requires explicit operator confirmation
    /// and releases no counter value (gaps are acceptable).
    pub async fn cancel(&self, student_id: Uuid, confirmed: bool) -> Result<StudentRecord, AppError> {
        if !confirmed {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cancellation requires explicit operator confirmation"
            )));
        }

        let mut student = self.require_student(student_id).await?;

        if student.stage.is_terminal() {
            return Err(AppError::InvalidTransition(anyhow::anyhow!(
                "Student is already cancelled"
            )));
        }

        student.stage = LifecycleStage::Cancelled;
        student.active = false;
        self.students.update_student(&student).await?;

        info!(student_id = %student_id, "Student cancelled");

        Ok(student)
    }

    /// Repair a stale stored stage from the receipt history. The stage is a
    /// cache of a re-derivable fact; it only ever moves forward here.
    pub async fn reconcile_stage(&self, student_id: Uuid) -> Result<StudentRecord, AppError> {
        let mut student = self.require_student(student_id).await?;

        if student.stage.is_terminal() {
            return Ok(student);
        }

        let receipts = self.receipts.receipts_for_student(student_id).await?;
        let derived = derive_stage(&student, &receipts);

        if derived > student.stage {
            warn!(
                student_id = %student_id,
                stored = %student.stage,
                derived = %derived,
                "Stored lifecycle stage was stale, repairing from receipts"
            );
            student.stage = derived;
            self.students.update_student(&student).await?;
        }

        Ok(student)
    }

    async fn require_student(&self, student_id: Uuid) -> Result<StudentRecord, AppError> {
        self.students
            .get_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))
    }

    /// Allocate a receipt number and persist the immutable receipt.
    /// Validation happens before allocation so a rejected payment wastes no
    /// counter value.
    async fn record_receipt(
        &self,
        student: &StudentRecord,
        component: FeeComponent,
        input: CreateReceipt,
    ) -> Result<FeeReceipt, AppError> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Receipt amount must be positive, got {}",
                input.amount
            )));
        }

        let branch = Branch::new(student.branch_id, student.branch_code.clone());
        let allocated = self
            .allocator
            .allocate(&branch, SequenceKind::ReceiptNo, student.cycle)
            .await?;

        let receipt = FeeReceipt {
            receipt_id: Uuid::new_v4(),
            receipt_no: allocated.formatted,
            student_id: student.student_id,
            branch_id: student.branch_id,
            cycle: student.cycle,
            component,
            amount: input.amount,
            payment: input.payment,
            paid_on: input.paid_on,
            remarks: input.remarks,
            created_utc: Utc::now(),
        };

        self.receipts.insert_receipt(&receipt).await?;

        RECEIPTS_TOTAL
            .with_label_values(&[receipt.payment.mode()])
            .inc();
        if let Some(amount) = receipt.amount.to_f64() {
            FEE_AMOUNT_TOTAL
                .with_label_values(&[component.as_str()])
                .inc_by(amount);
        }
        info!(
            student_id = %student.student_id,
            receipt_no = %receipt.receipt_no,
            amount = %receipt.amount,
            component = component.as_str(),
            "Fee receipt recorded"
        );

        Ok(receipt)
    }
}

/// The minimal stage consistent with the durable evidence: an assigned
/// registration number means `Registered`; an admission receipt means at
/// least `AdmissionFeePaid`.
pub fn derive_stage(student: &StudentRecord, receipts: &[FeeReceipt]) -> LifecycleStage {
    if student.registration_no.is_some() {
        return LifecycleStage::Registered;
    }
    if receipts
        .iter()
        .any(|r| r.component == FeeComponent::Admission)
    {
        return LifecycleStage::AdmissionFeePaid;
    }
    student.stage
}
