//! Converts the tuples in a SQL dump into the CSV dataset.

use applicant_data::config::DumpConfig;
use applicant_data::dump_parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "applicant_data=info".into()),
        )
        .init();

    let config = DumpConfig::from_env();

    if !config.input_path.exists() {
        tracing::error!("Input file not found: {}", config.input_path.display());
        println!("❌ File Not Found: {}", config.input_path.display());
        return ExitCode::FAILURE;
    }

    match dump_parser::convert(&config.input_path, &config.output_path) {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}
