use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;

use crate::errors::{AppError, ResultExt};
use crate::models::{ApplicantRecord, ApplicantType, InsertedApplicant, SegmentBatch};

pub const APPLICANTS_TABLE: &str = "tbl_applicants";
pub const MSME_TABLE: &str = "tbl_msme_attributes";
pub const ECOMMERCE_TABLE: &str = "tbl_ecommerce_attributes";
pub const INDIVIDUAL_TABLE: &str = "tbl_individual_attributes";

/// Bind parameters Postgres accepts in a single statement.
pub const POSTGRES_MAX_BIND_PARAMS: usize = 65_535;
/// Columns bound per row by the applicant insert, the widest statement per batch.
pub const APPLICANT_BIND_PARAMS: usize = 8;
/// Largest batch whose applicant insert fits in one statement.
pub const MAX_BATCH_SIZE: usize = POSTGRES_MAX_BIND_PARAMS / APPLICANT_BIND_PARAMS;

/// Destination for generated applicants and their segment rows.
#[allow(async_fn_in_trait)]
pub trait ApplicantStore {
    /// Inserts one batch atomically and returns the id assigned to every row.
    async fn insert_applicants(
        &mut self,
        applicants: &[ApplicantRecord],
    ) -> Result<Vec<InsertedApplicant>, AppError>;

    /// Appends the segment rows derived from an inserted batch.
    async fn append_segments(&mut self, segments: &SegmentBatch) -> Result<(), AppError>;
}

/// Postgres-backed [`ApplicantStore`].
pub struct PgApplicantStore {
    pool: PgPool,
}

impl PgApplicantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_msme(
        tx: &mut Transaction<'_, Postgres>,
        segments: &SegmentBatch,
    ) -> Result<(), AppError> {
        if segments.msme.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (applicant_id, inventory_turnover_ratio, customer_refund_rate, \
             stockout_frequency, sales_growth_velocity, supplier_payment_delay) ",
            MSME_TABLE
        ));
        builder.push_values(&segments.msme, |mut b, row| {
            b.push_bind(row.applicant_id)
                .push_bind(row.inventory_turnover_ratio)
                .push_bind(row.customer_refund_rate)
                .push_bind(row.stockout_frequency)
                .push_bind(row.sales_growth_velocity)
                .push_bind(row.supplier_payment_delay);
        });

        builder
            .build()
            .execute(&mut **tx)
            .await
            .context("Appending MSME attributes")?;
        Ok(())
    }

    async fn insert_ecommerce(
        tx: &mut Transaction<'_, Postgres>,
        segments: &SegmentBatch,
    ) -> Result<(), AppError> {
        if segments.ecommerce.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (applicant_id, essential_basket_index, order_regularity_score, \
             bnpl_repayment_speed, cancelled_order_ratio) ",
            ECOMMERCE_TABLE
        ));
        builder.push_values(&segments.ecommerce, |mut b, row| {
            b.push_bind(row.applicant_id)
                .push_bind(row.essential_basket_index)
                .push_bind(row.order_regularity_score)
                .push_bind(row.bnpl_repayment_speed)
                .push_bind(row.cancelled_order_ratio);
        });

        builder
            .build()
            .execute(&mut **tx)
            .await
            .context("Appending E-Commerce attributes")?;
        Ok(())
    }

    async fn insert_individual(
        tx: &mut Transaction<'_, Postgres>,
        segments: &SegmentBatch,
    ) -> Result<(), AppError> {
        if segments.individual.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (applicant_id, recharge_buffer, emergency_fund_idx, ott_sub_freq) ",
            INDIVIDUAL_TABLE
        ));
        builder.push_values(&segments.individual, |mut b, row| {
            b.push_bind(row.applicant_id)
                .push_bind(row.recharge_buffer)
                .push_bind(row.emergency_fund_idx)
                .push_bind(row.ott_sub_freq);
        });

        builder
            .build()
            .execute(&mut **tx)
            .await
            .context("Appending Individual attributes")?;
        Ok(())
    }
}

impl ApplicantStore for PgApplicantStore {
    async fn insert_applicants(
        &mut self,
        applicants: &[ApplicantRecord],
    ) -> Result<Vec<InsertedApplicant>, AppError> {
        if applicants.is_empty() {
            return Ok(vec![]);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Starting applicant transaction")?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (utilization_ratio, debt_to_income, credit_history_score, \
             loan_duration, age, is_unbanked, applicant_type, default_status) ",
            APPLICANTS_TABLE
        ));
        builder.push_values(applicants, |mut b, a| {
            b.push_bind(a.utilization_ratio)
                .push_bind(a.debt_to_income)
                .push_bind(a.credit_history_score)
                .push_bind(a.loan_duration)
                .push_bind(a.age)
                .push_bind(a.is_unbanked)
                .push_bind(a.applicant_type.as_str())
                .push_bind(a.default_status);
        });
        // Ids come straight back from the insert; no follow-up lookup.
        builder.push(" RETURNING applicant_id, applicant_type");

        let rows: Vec<(i32, String)> = builder
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .context("Inserting applicant batch")?;

        tx.commit().await.context("Committing applicant batch")?;

        rows.into_iter()
            .map(|(applicant_id, applicant_type)| {
                let applicant_type = applicant_type
                    .parse::<ApplicantType>()
                    .map_err(|e| AppError::DatabaseError(sqlx::Error::Decode(e.into())))?;
                Ok(InsertedApplicant {
                    applicant_id,
                    applicant_type,
                })
            })
            .collect()
    }

    async fn append_segments(&mut self, segments: &SegmentBatch) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Starting segment transaction")?;

        Self::insert_msme(&mut tx, segments).await?;
        Self::insert_ecommerce(&mut tx, segments).await?;
        Self::insert_individual(&mut tx, segments).await?;

        tx.commit().await.context("Committing segment rows")?;
        Ok(())
    }
}

/// Keeps everything in memory. Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct InMemoryApplicantStore {
    pub applicants: Vec<(i32, ApplicantRecord)>,
    pub segments: SegmentBatch,
}

impl InMemoryApplicantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment row count per applicant id.
    pub fn segment_rows_by_applicant(&self) -> HashMap<i32, (ApplicantType, usize)> {
        let mut counts: HashMap<i32, (ApplicantType, usize)> = HashMap::new();
        let ids = self
            .segments
            .msme
            .iter()
            .map(|r| (r.applicant_id, ApplicantType::Msme))
            .chain(
                self.segments
                    .ecommerce
                    .iter()
                    .map(|r| (r.applicant_id, ApplicantType::ECommerce)),
            )
            .chain(
                self.segments
                    .individual
                    .iter()
                    .map(|r| (r.applicant_id, ApplicantType::Individual)),
            );

        for (id, kind) in ids {
            counts.entry(id).or_insert((kind, 0)).1 += 1;
        }
        counts
    }
}

impl ApplicantStore for InMemoryApplicantStore {
    async fn insert_applicants(
        &mut self,
        applicants: &[ApplicantRecord],
    ) -> Result<Vec<InsertedApplicant>, AppError> {
        let mut inserted = Vec::with_capacity(applicants.len());
        for record in applicants {
            let applicant_id = self.applicants.len() as i32 + 1;
            self.applicants.push((applicant_id, record.clone()));
            inserted.push(InsertedApplicant {
                applicant_id,
                applicant_type: record.applicant_type,
            });
        }
        Ok(inserted)
    }

    async fn append_segments(&mut self, segments: &SegmentBatch) -> Result<(), AppError> {
        self.segments.msme.extend_from_slice(&segments.msme);
        self.segments.ecommerce.extend_from_slice(&segments.ecommerce);
        self.segments
            .individual
            .extend_from_slice(&segments.individual);
        Ok(())
    }
}
