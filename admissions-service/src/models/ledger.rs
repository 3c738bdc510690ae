//! Derived financial state. Never stored; recomputed on demand from the
//! course fee config and the receipt history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a monthly installment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the schedule.
    pub ordinal: u32,
    pub due_amount: Decimal,
}

/// The authoritative financial summary of a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFinancialState {
    pub total_due: Decimal,
    pub total_paid: Decimal,
    /// Signed balance; negative when the student has overpaid. The true
    /// value is preserved for audit.
    pub pending_balance: Decimal,
    pub effective_admission_fee: Decimal,
    /// Empty for one-time plans.
    pub installments: Vec<Installment>,
}

impl StudentFinancialState {
    /// Balance floored at zero, for display surfaces that clamp overpayment.
    pub fn display_balance(&self) -> Decimal {
        self.pending_balance.max(Decimal::ZERO)
    }
}
