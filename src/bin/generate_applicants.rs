//! Fills the applicant and segment tables with synthetic loan applicants.

use applicant_data::config::GeneratorConfig;
use applicant_data::db::Database;
use applicant_data::generator::ApplicantGenerator;
use applicant_data::storage::PgApplicantStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "applicant_data=info".into()),
        )
        .init();

    let config = GeneratorConfig::from_env()?;

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let store = PgApplicantStore::new(db.pool.clone());
    let mut generator = ApplicantGenerator::new(store, config.seed, config.batch_size);

    tracing::info!(
        "Generating {} applicants in batches of {}",
        config.total_rows,
        config.batch_size
    );
    let written = generator.generate(config.total_rows).await?;

    println!("Successfully injected {} rows.", written);
    Ok(())
}
