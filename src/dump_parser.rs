//! Converts the row tuples embedded in a SQL dump into a CSV dataset.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::encoding::{decode_with_fallback, TextEncoding};
use crate::errors::{AppError, ResultExt};
use crate::literal::parse_tuple_list;
use crate::table::DataTable;

/// Output schema, in column order.
pub const COLUMNS: [&str; 9] = [
    "Applicant_ID",
    "Utilization_Ratio",
    "Debt_to_Income",
    "Checking_Account_Status",
    "Loan_Duration",
    "Age",
    "Credit_History_Score",
    "Loan_Purpose",
    "Default_Status",
];

/// Rows shown in the post-conversion preview.
pub const PREVIEW_ROWS: usize = 5;

const TUPLE_PATTERN: &str = r"\(\d+,\s*[\d\.]+,.*?\)";

fn tuple_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TUPLE_PATTERN).expect("tuple pattern is valid"))
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub encoding: TextEncoding,
    pub output_path: PathBuf,
    pub table: DataTable,
}

impl ConversionSummary {
    pub fn rows(&self) -> usize {
        self.table.len()
    }
}

/// Every non-overlapping `(id, number, ...)` tuple in `text`, in order.
pub fn extract_tuples(text: &str) -> Vec<&str> {
    tuple_regex().find_iter(text).map(|m| m.as_str()).collect()
}

/// Parses extracted tuples into a table under [`COLUMNS`].
pub fn tuples_to_table(tuples: &[&str]) -> Result<DataTable, AppError> {
    let literal_list = format!("[{}]", tuples.join(","));
    let rows = parse_tuple_list(&literal_list)?;
    DataTable::new(&COLUMNS, rows)
}

/// Decodes `input`, extracts its row tuples and writes them as CSV to `output`.
///
/// # Errors
///
/// - [`AppError::DecodeFailed`] when no candidate encoding fits.
/// - [`AppError::NoDataFound`] when the text holds no tuples.
/// - [`AppError::LiteralParse`] / [`AppError::ColumnMismatch`] when a tuple is malformed.
///
/// No output file exists after any error.
pub fn convert_dump_file(input: &Path, output: &Path) -> Result<ConversionSummary, AppError> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Reading dump file {}", input.display()))?;

    let (encoding, raw) = decode_with_fallback(&bytes)
        .ok_or_else(|| AppError::DecodeFailed(input.display().to_string()))?;
    tracing::info!("File successfully read using encoding: {}", encoding);

    let tuples = extract_tuples(raw.trim());
    if tuples.is_empty() {
        return Err(AppError::NoDataFound(input.display().to_string()));
    }
    tracing::debug!("Matched {} row tuples", tuples.len());

    let table = tuples_to_table(&tuples)?;
    table.write_csv(output)?;

    Ok(ConversionSummary {
        encoding,
        output_path: output.to_path_buf(),
        table,
    })
}

/// Runs [`convert_dump_file`] and reports the outcome instead of returning an error.
pub fn convert(input: &Path, output: &Path) -> Option<ConversionSummary> {
    match convert_dump_file(input, output) {
        Ok(summary) => {
            tracing::info!(
                "Converted {} records from {} to {}",
                summary.rows(),
                input.display(),
                summary.output_path.display()
            );
            println!("{}", "=".repeat(40));
            println!("✅ SUCCESS: {} records converted.", summary.rows());
            println!("📊 Saved to: {}", summary.output_path.display());
            println!("{}", "=".repeat(40));
            println!("{}", summary.table.preview(PREVIEW_ROWS));
            Some(summary)
        }
        Err(e) => {
            let message = failure_message(&e);
            tracing::error!("{}", message);
            println!("❌ {}", message);
            None
        }
    }
}

fn failure_message(e: &AppError) -> String {
    if e.is_processing_error() {
        format!("Processing Error: {}", e)
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tuples_in_encounter_order() {
        let text = "INSERT INTO t VALUES (1, 0.23, 500, 1, 36, 29, 1, 2, 0),(2,0.5,'x',1,12,40,0,3,1);\n\
                    -- (note) (3 , 0.1, 1)";

        assert_eq!(
            extract_tuples(text),
            vec![
                "(1, 0.23, 500, 1, 36, 29, 1, 2, 0)",
                "(2,0.5,'x',1,12,40,0,3,1)",
            ]
        );
    }

    #[test]
    fn tuple_match_does_not_cross_lines() {
        assert!(extract_tuples("(1, 0.2, 3\n, 4)").is_empty());
    }

    #[test]
    fn builds_table_from_well_formed_tuples() {
        let table = tuples_to_table(&[
            "(1, 0.23, 0.4, 1, 36, 29, 1, 2, 0)",
            "(2, 0.55, 0.31, 0, 12, 41, 0, 4, 1)",
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), COLUMNS);
    }

    #[test]
    fn wrong_field_count_fails_whole_batch() {
        let err = tuples_to_table(&[
            "(1, 0.23, 0.4, 1, 36, 29, 1, 2, 0)",
            "(2, 0.55, 0.31, 0, 12)",
        ])
        .unwrap_err();

        assert!(matches!(err, AppError::ColumnMismatch { row: 1, .. }));
    }

    #[test]
    fn read_failures_are_labelled_as_processing_errors() {
        let missing = Path::new("no/such/dump.sql");
        let err = convert_dump_file(missing, Path::new("unused.csv")).unwrap_err();

        assert!(matches!(err, AppError::WithContext { .. }));
        assert!(failure_message(&err).starts_with("Processing Error: Reading dump file"));
    }

    #[test]
    fn missing_data_is_reported_without_processing_label() {
        let err = AppError::NoDataFound("dump.sql".into());

        assert_eq!(
            failure_message(&err),
            "No valid data tuples found in dump.sql"
        );
    }
}
