use std::path::PathBuf;

use thiserror::Error;

/// Error type for building, opening and querying the event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed timestamp in a source record.
    #[error("malformed timestamp {value:?}: {source}")]
    TimestampParse {
        value: String,
        source: chrono::ParseError,
    },

    /// Coordinate specifier that is not 2 or 4 integers.
    #[error("malformed coordinate specifier {0:?}")]
    CoordinateParse(String),

    /// Color representation that is not a parseable hex string.
    #[error("unparseable color {0:?}")]
    ColorParse(String),

    /// Source record with fewer fields than expected.
    #[error("record too short: {0:?}")]
    MalformedRecord(String),

    /// No store file and no source files to build one from.
    #[error("no canvas history sources in {0:?}")]
    NoSourceData(PathBuf),

    /// A dictionary ran out of ids.
    #[error("{0} dictionary full")]
    DictionaryFull(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Store archive is missing one of its inner files.
    #[error("store is missing inner file {0:?}")]
    MissingStoreFile(String),

    /// Store archive contents could not be decoded.
    #[error("could not decode store file {0:?}")]
    Decode(String),

    /// Store contents could not be encoded.
    #[error("could not encode store file {0:?}")]
    Encode(String),

    #[error("archive error: {0:?}")]
    Archive(mla::errors::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
