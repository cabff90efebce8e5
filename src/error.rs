use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by ledger operations.
///
/// Every variant is returned before the ledger is touched.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    /// The description was empty or only whitespace.
    #[error("Description must not be empty.")]
    EmptyDescription,

    /// The amount was NaN or infinite.
    #[error("Amount must be a finite number, got {0}.")]
    NonFiniteAmount(f64),

    /// The amount is finite but too large to hold as a decimal.
    #[error("Amount {0} is out of range.")]
    AmountOutOfRange(f64),

    /// A stored entry carries an amount beyond the accepted bound.
    #[error("Entry {index} has an amount out of range.")]
    StoredAmountOutOfRange { index: usize },

    /// A ledger needs at least its genesis entry.
    #[error("A ledger must contain a genesis entry.")]
    EmptyChain,
}

/// Errors raised while reading or writing the persisted ledger.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ledger document {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
