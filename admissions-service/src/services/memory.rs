//! In-memory store. Backs the integration tests and embedded use; the
//! increment takes a single write lock so allocations on one key are
//! strictly serialized, matching the durable store's contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use registrar_core::error::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CounterKey, CourseFeeConfig, FeeReceipt, StudentRecord};
use crate::services::store::{
    CounterStore, CourseFeeProvider, CredentialSink, ReceiptStore, StudentStore,
};

#[derive(Default)]
pub struct MemoryStore {
    counters: RwLock<HashMap<CounterKey, i64>>,
    receipts: RwLock<Vec<FeeReceipt>>,
    students: RwLock<HashMap<Uuid, StudentRecord>>,
    courses: RwLock<HashMap<Uuid, CourseFeeConfig>>,
    credentials: RwLock<HashMap<Uuid, (String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a course fee config (master data is read-only to the engine).
    pub async fn put_fee_config(&self, config: CourseFeeConfig) {
        self.courses.write().await.insert(config.course_id, config);
    }

    /// Inspect stored credentials (test helper).
    pub async fn credentials_for(&self, student_id: Uuid) -> Option<(String, String)> {
        self.credentials.read().await.get(&student_id).cloned()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &CounterKey) -> Result<i64, AppError> {
        let mut counters = self.counters.write().await;
        let value = counters.entry(key.clone()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn last_value(&self, key: &CounterKey) -> Result<i64, AppError> {
        Ok(self.counters.read().await.get(key).copied().unwrap_or(0))
    }

    async fn reset(&self, key: &CounterKey) -> Result<(), AppError> {
        self.counters.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn insert_receipt(&self, receipt: &FeeReceipt) -> Result<(), AppError> {
        let mut receipts = self.receipts.write().await;
        if receipts
            .iter()
            .any(|r| r.branch_id == receipt.branch_id && r.cycle == receipt.cycle && r.receipt_no == receipt.receipt_no)
        {
            return Err(AppError::DuplicateAllocation(anyhow::anyhow!(
                "Receipt number '{}' already exists for this branch and cycle",
                receipt.receipt_no
            )));
        }
        receipts.push(receipt.clone());
        Ok(())
    }

    async fn receipts_for_student(&self, student_id: Uuid) -> Result<Vec<FeeReceipt>, AppError> {
        Ok(self
            .receipts
            .read()
            .await
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn any_receipt_in_cycle(&self, branch_id: Uuid, cycle: i32) -> Result<bool, AppError> {
        Ok(self
            .receipts
            .read()
            .await
            .iter()
            .any(|r| r.branch_id == branch_id && r.cycle == cycle))
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn insert_student(&self, student: &StudentRecord) -> Result<(), AppError> {
        self.students
            .write()
            .await
            .insert(student.student_id, student.clone());
        Ok(())
    }

    async fn get_student(&self, student_id: Uuid) -> Result<Option<StudentRecord>, AppError> {
        Ok(self.students.read().await.get(&student_id).cloned())
    }

    async fn update_student(&self, student: &StudentRecord) -> Result<(), AppError> {
        let mut students = self.students.write().await;
        if !students.contains_key(&student.student_id) {
            return Err(AppError::NotFound(anyhow::anyhow!("Student not found")));
        }
        students.insert(student.student_id, student.clone());
        Ok(())
    }

    async fn any_identifier_in_cycle(
        &self,
        branch_id: Uuid,
        cycle: i32,
    ) -> Result<bool, AppError> {
        Ok(self.students.read().await.values().any(|s| {
            s.branch_id == branch_id
                && s.cycle == cycle
                && (s.registration_no.is_some() || s.enrollment_no.is_some())
        }))
    }
}

#[async_trait]
impl CourseFeeProvider for MemoryStore {
    async fn fee_config(&self, course_id: Uuid) -> Result<Option<CourseFeeConfig>, AppError> {
        Ok(self.courses.read().await.get(&course_id).cloned())
    }
}

#[async_trait]
impl CredentialSink for MemoryStore {
    async fn store_credentials(
        &self,
        student_id: Uuid,
        username: &str,
        password: &str,
    ) -> Result<(), AppError> {
        self.credentials
            .write()
            .await
            .insert(student_id, (username.to_string(), password.to_string()));
        Ok(())
    }
}
