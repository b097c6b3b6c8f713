//! Applicant Dataset Tools Library
//!
//! Two independent pipelines for the loan-applicant credit dataset: a converter
//! that lifts row tuples out of SQL dumps into CSV, and a generator that fills
//! the applicant and segment tables with synthetic records.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `dump_parser`: SQL dump to CSV conversion.
//! - `encoding`: Text decoding with encoding fallback.
//! - `errors`: Error handling types.
//! - `generator`: Synthetic applicant generation.
//! - `literal`: Restricted literal evaluator for row tuples.
//! - `models`: Applicant and segment data models.
//! - `storage`: Applicant storage backends.
//! - `table`: Tabular output and CSV writing.

pub mod config;
pub mod db;
pub mod dump_parser;
pub mod encoding;
pub mod errors;
pub mod generator;
pub mod literal;
pub mod models;
pub mod storage;
pub mod table;
