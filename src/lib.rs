//! Hash-chained personal ledger.
//!
//! Every [`Entry`] commits to the hash of the one before it, so editing any
//! stored entry after the fact shows up in [`Ledger::verify`]. A [`Store`]
//! keeps the chain on disk as a JSON document.

mod entry;
pub mod error;
pub(crate) mod hash_writer;
mod ledger;
pub mod store;

pub use entry::{
    AMOUNT_SCALE, Entry, GENESIS_DESCRIPTION, GENESIS_PREVIOUS_HASH, MAX_AMOUNT, format_amount,
};
pub use error::{LedgerError, StoreError};
pub use ledger::{ChainFault, FaultKind, Ledger, Verification, VerifyOptions};
pub use store::{EntryRecord, Store};
