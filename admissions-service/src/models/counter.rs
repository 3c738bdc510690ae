//! Sequence counter model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kinds of sequential identifiers the institute issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    RegistrationNo,
    EnrollmentNo,
    ReceiptNo,
    ExamSerialNo,
}

impl SequenceKind {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistrationNo => "registration_no",
            Self::EnrollmentNo => "enrollment_no",
            Self::ReceiptNo => "receipt_no",
            Self::ExamSerialNo => "exam_serial_no",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "registration_no" => Some(Self::RegistrationNo),
            "enrollment_no" => Some(Self::EnrollmentNo),
            "receipt_no" => Some(Self::ReceiptNo),
            "exam_serial_no" => Some(Self::ExamSerialNo),
            _ => None,
        }
    }
}

impl std::fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite key identifying one counter: branch x kind x academic cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterKey {
    pub branch_id: Uuid,
    pub kind: SequenceKind,
    pub cycle: i32,
}

impl CounterKey {
    pub fn new(branch_id: Uuid, kind: SequenceKind, cycle: i32) -> Self {
        Self {
            branch_id,
            kind,
            cycle,
        }
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.branch_id, self.kind, self.cycle)
    }
}

/// Branch reference carried by allocation calls; the code appears in
/// branch-prefixed identifiers such as enrollment numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub branch_id: Uuid,
    pub code: String,
}

impl Branch {
    pub fn new(branch_id: Uuid, code: impl Into<String>) -> Self {
        Self {
            branch_id,
            code: code.into(),
        }
    }
}
