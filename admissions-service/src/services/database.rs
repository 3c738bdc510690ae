//! Database service for admissions-service.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::models::{
    CounterKey, CourseFeeConfig, FeeComponent, FeeReceipt, LifecycleStage, PaymentDetail,
    PaymentPlan, StudentRecord,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{CounterStore, CourseFeeProvider, ReceiptStore, StudentStore};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "admissions-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Counter Operations
// -----------------------------------------------------------------------------

#[async_trait]
impl CounterStore for Database {
    /// One atomic find-and-increment statement: the row lock serializes
    /// callers on the same key while distinct keys never contend. Never a
    /// read-then-write pair.
    async fn increment(&self, key: &CounterKey) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["increment_counter"])
            .start_timer();

        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO counters (branch_id, kind, cycle, last_value)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (branch_id, kind, cycle)
            DO UPDATE SET last_value = counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(key.branch_id)
        .bind(key.kind.as_str())
        .bind(key.cycle)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::CounterUnavailable(anyhow::anyhow!("Failed to increment counter: {}", e))
        })?;

        timer.observe_duration();

        Ok(value)
    }

    async fn last_value(&self, key: &CounterKey) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["read_counter"])
            .start_timer();

        let value: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT last_value FROM counters
            WHERE branch_id = $1 AND kind = $2 AND cycle = $3
            "#,
        )
        .bind(key.branch_id)
        .bind(key.kind.as_str())
        .bind(key.cycle)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::CounterUnavailable(anyhow::anyhow!("Failed to read counter: {}", e))
        })?;

        timer.observe_duration();

        Ok(value.unwrap_or(0))
    }

    async fn reset(&self, key: &CounterKey) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["reset_counter"])
            .start_timer();

        sqlx::query(
            r#"
            DELETE FROM counters
            WHERE branch_id = $1 AND kind = $2 AND cycle = $3
            "#,
        )
        .bind(key.branch_id)
        .bind(key.kind.as_str())
        .bind(key.cycle)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to reset counter: {}", e))
        })?;

        timer.observe_duration();

        info!(key = %key, "Counter reset");

        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Receipt Operations
// -----------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct FeeReceiptRow {
    receipt_id: Uuid,
    receipt_no: String,
    student_id: Uuid,
    branch_id: Uuid,
    cycle: i32,
    component: String,
    amount: Decimal,
    payment_mode: String,
    bank_name: Option<String>,
    instrument_no: Option<String>,
    instrument_date: Option<NaiveDate>,
    paid_on: NaiveDate,
    remarks: Option<String>,
    created_utc: DateTime<Utc>,
}

impl From<FeeReceiptRow> for FeeReceipt {
    fn from(row: FeeReceiptRow) -> Self {
        let payment = match row.payment_mode.as_str() {
            "cheque" => PaymentDetail::Cheque {
                bank: row.bank_name.unwrap_or_default(),
                number: row.instrument_no.unwrap_or_default(),
                date: row.instrument_date.unwrap_or(row.paid_on),
            },
            "online" => PaymentDetail::Online {
                bank: row.bank_name.unwrap_or_default(),
                txn_id: row.instrument_no.unwrap_or_default(),
                date: row.instrument_date.unwrap_or(row.paid_on),
            },
            _ => PaymentDetail::Cash,
        };

        FeeReceipt {
            receipt_id: row.receipt_id,
            receipt_no: row.receipt_no,
            student_id: row.student_id,
            branch_id: row.branch_id,
            cycle: row.cycle,
            component: FeeComponent::from_string(&row.component),
            amount: row.amount,
            payment,
            paid_on: row.paid_on,
            remarks: row.remarks,
            created_utc: row.created_utc,
        }
    }
}

/// Mode-specific columns for a payment detail.
fn payment_columns(payment: &PaymentDetail) -> (Option<&str>, Option<&str>, Option<NaiveDate>) {
    match payment {
        PaymentDetail::Cash => (None, None, None),
        PaymentDetail::Cheque { bank, number, date } => {
            (Some(bank.as_str()), Some(number.as_str()), Some(*date))
        }
        PaymentDetail::Online { bank, txn_id, date } => {
            (Some(bank.as_str()), Some(txn_id.as_str()), Some(*date))
        }
    }
}

#[async_trait]
impl ReceiptStore for Database {
    async fn insert_receipt(&self, receipt: &FeeReceipt) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_receipt"])
            .start_timer();

        let (bank_name, instrument_no, instrument_date) = payment_columns(&receipt.payment);

        sqlx::query(
            r#"
            INSERT INTO fee_receipts (
                receipt_id, receipt_no, student_id, branch_id, cycle, component, amount,
                payment_mode, bank_name, instrument_no, instrument_date, paid_on, remarks, created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(receipt.receipt_id)
        .bind(&receipt.receipt_no)
        .bind(receipt.student_id)
        .bind(receipt.branch_id)
        .bind(receipt.cycle)
        .bind(receipt.component.as_str())
        .bind(receipt.amount)
        .bind(receipt.payment.mode())
        .bind(bank_name)
        .bind(instrument_no)
        .bind(instrument_date)
        .bind(receipt.paid_on)
        .bind(&receipt.remarks)
        .bind(receipt.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                // Structurally impossible given the atomic increment; if it
                // ever fires the storage layer is broken.
                error!(
                    receipt_no = %receipt.receipt_no,
                    "Duplicate receipt number from the counter store"
                );
                AppError::DuplicateAllocation(anyhow::anyhow!(
                    "Receipt number '{}' already exists for this branch and cycle",
                    receipt.receipt_no
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert receipt: {}", e)),
        })?;

        timer.observe_duration();

        info!(receipt_no = %receipt.receipt_no, "Fee receipt persisted");

        Ok(())
    }

    async fn receipts_for_student(&self, student_id: Uuid) -> Result<Vec<FeeReceipt>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["receipts_for_student"])
            .start_timer();

        let rows = sqlx::query_as::<_, FeeReceiptRow>(
            r#"
            SELECT receipt_id, receipt_no, student_id, branch_id, cycle, component, amount,
                payment_mode, bank_name, instrument_no, instrument_date, paid_on, remarks, created_utc
            FROM fee_receipts
            WHERE student_id = $1
            ORDER BY created_utc, receipt_no
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get receipts: {}", e)))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(FeeReceipt::from).collect())
    }

    async fn any_receipt_in_cycle(&self, branch_id: Uuid, cycle: i32) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["any_receipt_in_cycle"])
            .start_timer();

        let exists: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM fee_receipts
            WHERE branch_id = $1 AND cycle = $2
            LIMIT 1
            "#,
        )
        .bind(branch_id)
        .bind(cycle)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check receipts: {}", e)))?;

        timer.observe_duration();

        Ok(exists.is_some())
    }
}

// -----------------------------------------------------------------------------
// Student Operations
// -----------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct StudentRow {
    student_id: Uuid,
    branch_id: Uuid,
    branch_code: String,
    cycle: i32,
    name: String,
    guardian_name: Option<String>,
    phone: Option<String>,
    course_ids: Vec<Uuid>,
    payment_plan: String,
    stage: String,
    active: bool,
    enrollment_no: Option<String>,
    registration_no: Option<String>,
    created_utc: DateTime<Utc>,
    registered_utc: Option<DateTime<Utc>>,
}

impl From<StudentRow> for StudentRecord {
    fn from(row: StudentRow) -> Self {
        StudentRecord {
            student_id: row.student_id,
            branch_id: row.branch_id,
            branch_code: row.branch_code,
            cycle: row.cycle,
            name: row.name,
            guardian_name: row.guardian_name,
            phone: row.phone,
            course_ids: row.course_ids,
            payment_plan: PaymentPlan::from_string(&row.payment_plan),
            stage: LifecycleStage::from_string(&row.stage),
            active: row.active,
            enrollment_no: row.enrollment_no,
            registration_no: row.registration_no,
            created_utc: row.created_utc,
            registered_utc: row.registered_utc,
        }
    }
}

#[async_trait]
impl StudentStore for Database {
    async fn insert_student(&self, student: &StudentRecord) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_student"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO students (
                student_id, branch_id, branch_code, cycle, name, guardian_name, phone,
                course_ids, payment_plan, stage, active, enrollment_no, registration_no,
                created_utc, registered_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(student.student_id)
        .bind(student.branch_id)
        .bind(&student.branch_code)
        .bind(student.cycle)
        .bind(&student.name)
        .bind(&student.guardian_name)
        .bind(&student.phone)
        .bind(&student.course_ids)
        .bind(student.payment_plan.as_str())
        .bind(student.stage.as_str())
        .bind(student.active)
        .bind(&student.enrollment_no)
        .bind(&student.registration_no)
        .bind(student.created_utc)
        .bind(student.registered_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert student: {}", e)))?;

        timer.observe_duration();

        info!(student_id = %student.student_id, "Student record created");

        Ok(())
    }

    async fn get_student(&self, student_id: Uuid) -> Result<Option<StudentRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_student"])
            .start_timer();

        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT student_id, branch_id, branch_code, cycle, name, guardian_name, phone,
                course_ids, payment_plan, stage, active, enrollment_no, registration_no,
                created_utc, registered_utc
            FROM students
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get student: {}", e)))?;

        timer.observe_duration();

        Ok(row.map(StudentRecord::from))
    }

    async fn update_student(&self, student: &StudentRecord) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_student"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE students
            SET name = $2,
                guardian_name = $3,
                phone = $4,
                course_ids = $5,
                payment_plan = $6,
                stage = $7,
                active = $8,
                enrollment_no = $9,
                registration_no = $10,
                registered_utc = $11
            WHERE student_id = $1
            "#,
        )
        .bind(student.student_id)
        .bind(&student.name)
        .bind(&student.guardian_name)
        .bind(&student.phone)
        .bind(&student.course_ids)
        .bind(student.payment_plan.as_str())
        .bind(student.stage.as_str())
        .bind(student.active)
        .bind(&student.enrollment_no)
        .bind(&student.registration_no)
        .bind(student.registered_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update student: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Student not found")));
        }

        Ok(())
    }

    async fn any_identifier_in_cycle(
        &self,
        branch_id: Uuid,
        cycle: i32,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["any_identifier_in_cycle"])
            .start_timer();

        let exists: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM students
            WHERE branch_id = $1 AND cycle = $2
              AND (registration_no IS NOT NULL OR enrollment_no IS NOT NULL)
            LIMIT 1
            "#,
        )
        .bind(branch_id)
        .bind(cycle)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check identifiers: {}", e))
        })?;

        timer.observe_duration();

        Ok(exists.is_some())
    }
}

// -----------------------------------------------------------------------------
// Course Master Data (read-only)
// -----------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct CourseFeeRow {
    course_id: Uuid,
    total_fees: Decimal,
    admission_fees: Decimal,
    registration_fees: Decimal,
    monthly_fees: Decimal,
    installment_count: i32,
}

#[async_trait]
impl CourseFeeProvider for Database {
    async fn fee_config(&self, course_id: Uuid) -> Result<Option<CourseFeeConfig>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["fee_config"])
            .start_timer();

        let row = sqlx::query_as::<_, CourseFeeRow>(
            r#"
            SELECT course_id, total_fees, admission_fees, registration_fees,
                monthly_fees, installment_count
            FROM course_fee_configs
            WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get fee config: {}", e))
        })?;

        timer.observe_duration();

        Ok(row.map(|r| CourseFeeConfig {
            course_id: r.course_id,
            total_fees: r.total_fees,
            admission_fees: r.admission_fees,
            registration_fees: r.registration_fees,
            monthly_fees: r.monthly_fees,
            installment_count: r.installment_count.max(0) as u32,
        }))
    }
}
