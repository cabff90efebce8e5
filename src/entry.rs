mod canonical;
mod entry_struct;
mod show;

pub use entry_struct::Entry;
pub use show::format_amount;

pub(crate) use canonical::{canonical_amount, canonical_timestamp};

/// Previous hash stored in the genesis entry, which has no predecessor.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Description given to the genesis entry of a fresh ledger.
pub const GENESIS_DESCRIPTION: &str = "Genesis Block";

/// Number of fractional digits amounts are kept at.
pub const AMOUNT_SCALE: u32 = 8;

/// Largest absolute amount a single entry may carry.
///
/// Keeps the balance of any ledger that fits in memory far below
/// `Decimal::MAX`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;
