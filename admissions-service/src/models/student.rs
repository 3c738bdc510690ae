//! Student record and lifecycle model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::PaymentPlan;

/// Coarse-grained admission/registration stage. The stored stage is a cache
/// of a fact that is always re-derivable from the receipt history; it never
/// silently regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Draft,
    AdmissionFeePending,
    AdmissionFeePaid,
    RegistrationPending,
    Registered,
    Cancelled,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::AdmissionFeePending => "admission_fee_pending",
            Self::AdmissionFeePaid => "admission_fee_paid",
            Self::RegistrationPending => "registration_pending",
            Self::Registered => "registered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "admission_fee_pending" => Self::AdmissionFeePending,
            "admission_fee_paid" => Self::AdmissionFeePaid,
            "registration_pending" => Self::RegistrationPending,
            "registered" => Self::Registered,
            "cancelled" => Self::Cancelled,
            _ => Self::Draft,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student as tracked by the admissions workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: Uuid,
    pub branch_id: Uuid,
    pub branch_code: String,
    pub cycle: i32,
    pub name: String,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub course_ids: Vec<Uuid>,
    pub payment_plan: PaymentPlan,
    pub stage: LifecycleStage,
    pub active: bool,
    pub enrollment_no: Option<String>,
    pub registration_no: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub registered_utc: Option<DateTime<Utc>>,
}

impl StudentRecord {
    /// The primary course line, used for fee-config lookups.
    pub fn primary_course(&self) -> Option<Uuid> {
        self.course_ids.first().copied()
    }
}

/// Input for submitting an admission draft.
#[derive(Debug, Clone, Validate)]
pub struct SubmitAdmission {
    pub branch_id: Uuid,
    #[validate(length(min = 1, message = "branch code is required"))]
    pub branch_code: String,
    pub cycle: i32,
    #[validate(length(min = 1, message = "student name is required"))]
    pub name: String,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub course_ids: Vec<Uuid>,
    pub payment_plan: PaymentPlan,
}

/// Credentials created at registration; handed to the identity collaborator
/// as an opaque sink.
#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Result of confirming a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub registration_no: String,
    pub stage: LifecycleStage,
    /// False when the call was an idempotent retry that returned the
    /// previously assigned number.
    pub newly_allocated: bool,
}
