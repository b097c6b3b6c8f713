use std::fmt;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// None of the candidate text encodings could decode the input file.
    DecodeFailed(String),
    /// The dump contained no row tuples.
    NoDataFound(String),
    /// The joined tuple list is not a valid literal expression.
    LiteralParse {
        /// Byte offset into the joined literal list.
        offset: usize,
        /// What went wrong at that offset.
        message: String,
    },
    /// A parsed tuple does not have one field per output column.
    ColumnMismatch {
        /// Zero-based index of the offending tuple.
        row: usize,
        /// Number of columns in the schema.
        expected: usize,
        /// Number of fields found in the tuple.
        found: usize,
    },
    /// Filesystem errors.
    Io(std::io::Error),
    /// Errors raised by the CSV writer.
    Csv(csv::Error),
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Missing or invalid configuration.
    Config(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DecodeFailed(path) => write!(
                f,
                "Could not decode {} with any supported encoding",
                path
            ),
            AppError::NoDataFound(path) => write!(f, "No valid data tuples found in {}", path),
            AppError::LiteralParse { offset, message } => {
                write!(f, "Malformed literal at offset {}: {}", offset, message)
            }
            AppError::ColumnMismatch {
                row,
                expected,
                found,
            } => write!(
                f,
                "Row {} has {} fields, expected {} columns",
                row, found, expected
            ),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Csv(e) => write!(f, "CSV error: {}", e),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Csv(e) => Some(e),
            AppError::DatabaseError(e) => Some(e),
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl AppError {
    /// True for the failures the dump converter reports as a processing error
    /// (as opposed to an unreadable or empty input).
    pub fn is_processing_error(&self) -> bool {
        match self {
            AppError::LiteralParse { .. }
            | AppError::ColumnMismatch { .. }
            | AppError::Csv(_)
            | AppError::Io(_) => true,
            AppError::WithContext { source, .. } => source.is_processing_error(),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
