//! Fee receipt model. Receipts are append-only: the ledger is always
//! recomputed from them, never from a sum cached on the student record.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which fee component a receipt settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeComponent {
    Admission,
    Course,
}

impl FeeComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admission => "admission",
            Self::Course => "course",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "admission" => Self::Admission,
            _ => Self::Course,
        }
    }
}

/// Payment mode with its mode-specific fields. Cheque and online payments
/// carry instrument details; cash carries none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaymentDetail {
    Cash,
    Cheque {
        bank: String,
        number: String,
        date: NaiveDate,
    },
    Online {
        bank: String,
        txn_id: String,
        date: NaiveDate,
    },
}

impl PaymentDetail {
    /// Metric / database label for the payment mode.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Cheque { .. } => "cheque",
            Self::Online { .. } => "online",
        }
    }
}

/// An immutable record of a single payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeReceipt {
    pub receipt_id: Uuid,
    pub receipt_no: String,
    pub student_id: Uuid,
    pub branch_id: Uuid,
    pub cycle: i32,
    pub component: FeeComponent,
    pub amount: Decimal,
    pub payment: PaymentDetail,
    pub paid_on: NaiveDate,
    pub remarks: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording a payment. The receipt number is allocated by the
/// engine and the fee component is decided by the operation, never supplied
/// by the caller.
#[derive(Debug, Clone)]
pub struct CreateReceipt {
    pub amount: Decimal,
    pub payment: PaymentDetail,
    pub paid_on: NaiveDate,
    pub remarks: Option<String>,
}
