//! Course fee configuration, read-only master data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a student settles the course fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlan {
    OneTime,
    Monthly,
}

impl PaymentPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Monthly => "monthly",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "monthly" => Self::Monthly,
            _ => Self::OneTime,
        }
    }
}

/// Fee structure of a course, owned by the course master data collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFeeConfig {
    pub course_id: Uuid,
    pub total_fees: Decimal,
    pub admission_fees: Decimal,
    pub registration_fees: Decimal,
    pub monthly_fees: Decimal,
    pub installment_count: u32,
}
