use std::env;

use applicant_data::db::Database;
use applicant_data::generator::ApplicantGenerator;
use applicant_data::storage::{
    PgApplicantStore, APPLICANTS_TABLE, ECOMMERCE_TABLE, INDIVIDUAL_TABLE, MSME_TABLE,
};

async fn count(pool: &sqlx::PgPool, table: &str) -> anyhow::Result<i64> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Integration smoke test for the Postgres applicant store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
/// Expects the four tables to exist and no concurrent writers.
#[tokio::test]
#[ignore]
async fn generate_batches_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let pool = db.pool.clone();

    let applicants_before = count(&pool, APPLICANTS_TABLE).await?;
    let mut segments_before = 0;
    for table in [MSME_TABLE, ECOMMERCE_TABLE, INDIVIDUAL_TABLE] {
        segments_before += count(&pool, table).await?;
    }

    let mut generator = ApplicantGenerator::new(PgApplicantStore::new(pool.clone()), 42, 1_000);
    let written = generator.generate(2_000).await?;

    let applicants_after = count(&pool, APPLICANTS_TABLE).await?;
    let mut segments_after = 0;
    for table in [MSME_TABLE, ECOMMERCE_TABLE, INDIVIDUAL_TABLE] {
        segments_after += count(&pool, table).await?;
    }

    assert_eq!(written, 2_000);
    assert_eq!(applicants_after - applicants_before, 2_000);
    assert_eq!(segments_after - segments_before, 2_000);

    // Segment rows must sit in the table matching their applicant's type.
    let mismatched: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM tbl_applicants a
        WHERE (a.applicant_type = 'MSME'
               AND NOT EXISTS (SELECT 1 FROM tbl_msme_attributes m WHERE m.applicant_id = a.applicant_id))
           OR (a.applicant_type = 'E-Commerce'
               AND NOT EXISTS (SELECT 1 FROM tbl_ecommerce_attributes e WHERE e.applicant_id = a.applicant_id))
           OR (a.applicant_type = 'Individual'
               AND NOT EXISTS (SELECT 1 FROM tbl_individual_attributes i WHERE i.applicant_id = a.applicant_id))
        "#,
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(mismatched, 0);

    Ok(())
}
