//! Domain models for admissions-service.

mod counter;
mod course;
mod ledger;
mod receipt;
mod student;

pub use counter::{Branch, CounterKey, SequenceKind};
pub use course::{CourseFeeConfig, PaymentPlan};
pub use ledger::{Installment, StudentFinancialState};
pub use receipt::{CreateReceipt, FeeComponent, FeeReceipt, PaymentDetail};
pub use student::{
    Credentials, LifecycleStage, RegistrationOutcome, StudentRecord, SubmitAdmission,
};
