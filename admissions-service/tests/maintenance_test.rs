//! Counter-reset maintenance tests: resets are explicit and refused once
//! history exists for the affected branch and cycle.

mod common;

use admissions_service::models::{CounterKey, PaymentPlan, SequenceKind};
use common::{admission_input, cash_receipt, test_branch, TestEngine, CYCLE};
use registrar_core::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn reset_restarts_an_unused_cycle() {
    let engine = TestEngine::new();
    let branch = test_branch();

    for _ in 0..3 {
        engine
            .allocator
            .allocate(&branch, SequenceKind::ExamSerialNo, CYCLE)
            .await
            .unwrap();
    }

    let key = CounterKey::new(branch.branch_id, SequenceKind::ExamSerialNo, CYCLE);
    engine.maintenance.reset_counter(&key).await.unwrap();

    let allocated = engine
        .allocator
        .allocate(&branch, SequenceKind::ExamSerialNo, CYCLE)
        .await
        .unwrap();
    assert_eq!(allocated.value, 1);
}

#[tokio::test]
async fn reset_refused_once_receipts_exist_for_the_cycle() {
    let engine = TestEngine::new();
    let branch = test_branch();

    let student = engine
        .lifecycle
        .submit_admission(admission_input(&branch, vec![Uuid::new_v4()], PaymentPlan::OneTime))
        .await
        .unwrap();
    engine
        .lifecycle
        .pay_admission_fee(student.student_id, cash_receipt(500))
        .await
        .unwrap();

    let key = CounterKey::new(branch.branch_id, SequenceKind::ReceiptNo, CYCLE);
    let err = engine.maintenance.reset_counter(&key).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The counter survived: numbering continues, nothing is reissued.
    let next = engine
        .allocator
        .allocate(&branch, SequenceKind::ReceiptNo, CYCLE)
        .await
        .unwrap();
    assert_eq!(next.value, 2);
}

#[tokio::test]
async fn reset_refused_once_identifiers_are_assigned_for_the_cycle() {
    let engine = TestEngine::new();
    let branch = test_branch();

    // Submitting a draft assigns an enrollment number.
    engine
        .lifecycle
        .submit_admission(admission_input(&branch, vec![Uuid::new_v4()], PaymentPlan::OneTime))
        .await
        .unwrap();

    let key = CounterKey::new(branch.branch_id, SequenceKind::EnrollmentNo, CYCLE);
    let err = engine.maintenance.reset_counter(&key).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn reset_of_one_key_leaves_other_cycles_alone() {
    let engine = TestEngine::new();
    let branch = test_branch();

    engine
        .allocator
        .allocate(&branch, SequenceKind::ExamSerialNo, CYCLE)
        .await
        .unwrap();
    engine
        .allocator
        .allocate(&branch, SequenceKind::ExamSerialNo, CYCLE + 1)
        .await
        .unwrap();

    let key = CounterKey::new(branch.branch_id, SequenceKind::ExamSerialNo, CYCLE);
    engine.maintenance.reset_counter(&key).await.unwrap();

    let next_cycle = engine
        .allocator
        .allocate(&branch, SequenceKind::ExamSerialNo, CYCLE + 1)
        .await
        .unwrap();
    assert_eq!(next_cycle.value, 2);
}
