//! Sequence allocator integration tests: uniqueness under concurrency,
//! peek semantics and identifier formats.

mod common;

use admissions_service::models::SequenceKind;
use common::{test_branch, TestEngine, CYCLE};
use futures::future::join_all;

#[tokio::test]
async fn concurrent_allocations_yield_distinct_contiguous_values() {
    for n in [2usize, 10, 100] {
        let engine = TestEngine::new();
        let branch = test_branch();

        let tasks: Vec<_> = (0..n)
            .map(|_| {
                let allocator = engine.allocator.clone();
                let branch = branch.clone();
                tokio::spawn(async move {
                    allocator
                        .allocate(&branch, SequenceKind::ReceiptNo, CYCLE)
                        .await
                        .expect("allocation failed")
                        .value
                })
            })
            .collect();

        let mut values: Vec<i64> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.expect("task panicked"))
            .collect();
        values.sort_unstable();

        let expected: Vec<i64> = (1..=n as i64).collect();
        assert_eq!(values, expected, "N={}: duplicates or gaps", n);
    }
}

#[tokio::test]
async fn distinct_keys_do_not_share_counters() {
    let engine = TestEngine::new();
    let branch_a = test_branch();
    let branch_b = test_branch();

    let a1 = engine
        .allocator
        .allocate(&branch_a, SequenceKind::ReceiptNo, CYCLE)
        .await
        .unwrap();
    let a2 = engine
        .allocator
        .allocate(&branch_a, SequenceKind::RegistrationNo, CYCLE)
        .await
        .unwrap();
    let a3 = engine
        .allocator
        .allocate(&branch_a, SequenceKind::ReceiptNo, CYCLE + 1)
        .await
        .unwrap();
    let b1 = engine
        .allocator
        .allocate(&branch_b, SequenceKind::ReceiptNo, CYCLE)
        .await
        .unwrap();

    // Every key starts its own sequence at 1.
    assert_eq!(a1.value, 1);
    assert_eq!(a2.value, 1);
    assert_eq!(a3.value, 1);
    assert_eq!(b1.value, 1);
}

#[tokio::test]
async fn peek_matches_next_allocation_on_untouched_key() {
    let engine = TestEngine::new();
    let branch = test_branch();

    let peeked = engine
        .allocator
        .peek_next(&branch, SequenceKind::RegistrationNo, CYCLE)
        .await
        .unwrap();
    let allocated = engine
        .allocator
        .allocate(&branch, SequenceKind::RegistrationNo, CYCLE)
        .await
        .unwrap();

    assert_eq!(peeked, allocated.formatted);
}

#[tokio::test]
async fn peek_twice_returns_same_value_and_consumes_nothing() {
    let engine = TestEngine::new();
    let branch = test_branch();

    let first = engine
        .allocator
        .peek_next(&branch, SequenceKind::ReceiptNo, CYCLE)
        .await
        .unwrap();
    let second = engine
        .allocator
        .peek_next(&branch, SequenceKind::ReceiptNo, CYCLE)
        .await
        .unwrap();

    assert_eq!(first, second);

    // Nothing was consumed by peeking.
    let allocated = engine
        .allocator
        .allocate(&branch, SequenceKind::ReceiptNo, CYCLE)
        .await
        .unwrap();
    assert_eq!(allocated.value, 1);
}

#[tokio::test]
async fn identifier_formats_per_kind() {
    let engine = TestEngine::new();
    let branch = test_branch();

    let registration = engine
        .allocator
        .allocate(&branch, SequenceKind::RegistrationNo, 2026)
        .await
        .unwrap();
    assert_eq!(registration.formatted, "2026-1001");

    let enrollment = engine
        .allocator
        .allocate(&branch, SequenceKind::EnrollmentNo, 2026)
        .await
        .unwrap();
    assert_eq!(enrollment.formatted, "HO/2026/0001");

    let receipt = engine
        .allocator
        .allocate(&branch, SequenceKind::ReceiptNo, 2026)
        .await
        .unwrap();
    assert_eq!(receipt.formatted, "000001");

    let exam = engine
        .allocator
        .allocate(&branch, SequenceKind::ExamSerialNo, 2026)
        .await
        .unwrap();
    assert_eq!(exam.formatted, "2026/0001");
}

#[tokio::test]
async fn registration_numbers_keep_increasing_within_a_key() {
    let engine = TestEngine::new();
    let branch = test_branch();

    let mut previous = 0;
    for _ in 0..5 {
        let allocated = engine
            .allocator
            .allocate(&branch, SequenceKind::RegistrationNo, CYCLE)
            .await
            .unwrap();
        assert!(allocated.value > previous);
        previous = allocated.value;
    }
}
