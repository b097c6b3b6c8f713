use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, ResultExt};
use crate::literal::{format_float, Literal};

/// Rows of literals under a fixed header.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Literal>>,
}

impl DataTable {
    /// Builds a table, rejecting any row whose width differs from the header.
    pub fn new(columns: &[&str], rows: Vec<Vec<Literal>>) -> Result<Self, AppError> {
        if let Some((row, fields)) = rows
            .iter()
            .enumerate()
            .find(|(_, fields)| fields.len() != columns.len())
        {
            return Err(AppError::ColumnMismatch {
                row,
                expected: columns.len(),
                found: fields.len(),
            });
        }

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Literal>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A purely numeric column holding any float or missing value is
    /// rendered as a float column, so its integers print as `1.0`.
    fn float_columns(&self) -> Vec<bool> {
        (0..self.columns.len())
            .map(|col| {
                let cells = || self.rows.iter().map(move |row| &row[col]);
                cells().all(|c| matches!(c, Literal::Int(_) | Literal::Float(_) | Literal::None))
                    && cells().any(|c| matches!(c, Literal::Float(_) | Literal::None))
            })
            .collect()
    }

    /// Cell text for every row, as it appears in the CSV output.
    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        let float_columns = self.float_columns();

        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&float_columns)
                    .map(|(cell, &as_float)| render_cell(cell, as_float))
                    .collect()
            })
            .collect()
    }

    /// Writes the table as CSV with a header row and no index column.
    ///
    /// Output goes to a sibling temp file that is renamed into place, so a
    /// failed write never leaves a partial file at `path`.
    pub fn write_csv(&self, path: &Path) -> Result<(), AppError> {
        let staging = staging_path(path);

        let result = self.write_csv_to(&staging).and_then(|()| {
            fs::rename(&staging, path)
                .with_context(|| format!("Moving CSV into place at {}", path.display()))
        });

        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }

        result
    }

    fn write_csv_to(&self, path: &Path) -> Result<(), AppError> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Creating CSV {}", path.display()))?;

        writer.write_record(&self.columns)?;
        for row in self.rendered_rows() {
            writer.write_record(&row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Renders the first `n` rows as an aligned text table with a row index.
    pub fn preview(&self, n: usize) -> String {
        let mut lines: Vec<Vec<String>> = vec![std::iter::once(String::new())
            .chain(self.columns.iter().cloned())
            .collect()];

        for (index, row) in self.rendered_rows().into_iter().take(n).enumerate() {
            lines.push(
                std::iter::once(index.to_string())
                    .chain(row.into_iter().map(|cell| {
                        if cell.is_empty() {
                            "NaN".to_string()
                        } else {
                            cell
                        }
                    }))
                    .collect(),
            );
        }

        let widths: Vec<usize> = (0..lines[0].len())
            .map(|col| {
                lines
                    .iter()
                    .map(|line| line[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        lines
            .iter()
            .map(|line| {
                line.iter()
                    .zip(&widths)
                    .map(|(cell, &width)| format!("{:>width$}", cell, width = width))
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_cell(cell: &Literal, as_float: bool) -> String {
    match cell {
        Literal::None => String::new(),
        Literal::Int(v) if as_float => format_float(*v as f64),
        other => other.to_string(),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[Literal]) -> Vec<Literal> {
        cells.to_vec()
    }

    #[test]
    fn rejects_row_with_wrong_width() {
        let err = DataTable::new(
            &["a", "b"],
            vec![
                row(&[Literal::Int(1), Literal::Int(2)]),
                row(&[Literal::Int(3)]),
            ],
        )
        .unwrap_err();

        match err {
            AppError::ColumnMismatch {
                row,
                expected,
                found,
            } => assert_eq!((row, expected, found), (1, 2, 1)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn mixed_numeric_columns_render_as_floats() {
        let table = DataTable::new(
            &["id", "ratio", "label", "flag"],
            vec![
                row(&[
                    Literal::Int(1),
                    Literal::Int(0),
                    Literal::Str("car".into()),
                    Literal::Bool(true),
                ]),
                row(&[
                    Literal::Int(2),
                    Literal::Float(0.55),
                    Literal::Int(7),
                    Literal::None,
                ]),
            ],
        )
        .unwrap();

        assert_eq!(
            table.rendered_rows(),
            vec![
                vec!["1", "0.0", "car", "True"],
                vec!["2", "0.55", "7", ""],
            ]
        );
    }

    #[test]
    fn write_csv_produces_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = DataTable::new(
            &["id", "note"],
            vec![
                row(&[Literal::Int(1), Literal::Str("a, b".into())]),
                row(&[Literal::Int(2), Literal::Str("plain".into())]),
            ],
        )
        .unwrap();

        table.write_csv(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,note\n1,\"a, b\"\n2,plain\n"
        );
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.csv");
        let table = DataTable::new(&["id"], vec![row(&[Literal::Int(1)])]).unwrap();

        assert!(table.write_csv(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn preview_is_aligned_and_limited() {
        let rows = (0..10)
            .map(|i| row(&[Literal::Int(i), Literal::Float(0.5)]))
            .collect();
        let table = DataTable::new(&["Applicant_ID", "Ratio"], rows).unwrap();

        let preview = table.preview(5);
        let lines: Vec<&str> = preview.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "   Applicant_ID  Ratio");
        assert_eq!(lines[1], "0             0    0.5");
    }
}
