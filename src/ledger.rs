mod verify;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{debug, warn};

use crate::entry::{Entry, GENESIS_DESCRIPTION, GENESIS_PREVIOUS_HASH, MAX_AMOUNT};
use crate::error::LedgerError;

pub use verify::{ChainFault, FaultKind, Verification, VerifyOptions};

/// Hash-chained sequence of entries, genesis first.
///
/// Entries built in memory are always consistent; only a ledger rebuilt from
/// outside data through [`Ledger::from_entries`] can fail verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<Entry>,
}

impl Ledger {
    /// A fresh ledger holding only a genesis entry stamped now.
    pub fn create() -> Self {
        Self::create_at(Utc::now())
    }

    pub fn create_at(timestamp: DateTime<Utc>) -> Self {
        let genesis = Entry::new_derived(
            0,
            timestamp,
            GENESIS_DESCRIPTION,
            Decimal::ZERO,
            GENESIS_PREVIOUS_HASH,
        );
        debug!(hash = genesis.content_hash(), "created genesis entry");
        Self {
            entries: vec![genesis],
        }
    }

    /// Rebuilds a ledger from stored entries without verifying them.
    ///
    /// Only the shape is checked: at least one entry, every amount within
    /// [`MAX_AMOUNT`].
    pub fn from_entries(entries: Vec<Entry>) -> Result<Self, LedgerError> {
        if entries.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        let max = Decimal::from(MAX_AMOUNT);
        if let Some(index) = entries.iter().position(|e| e.amount().abs() > max) {
            return Err(LedgerError::StoredAmountOutOfRange { index });
        }
        Ok(Self { entries })
    }

    /// Appends a transaction stamped now.
    pub fn append(&mut self, description: &str, amount: f64) -> Result<&Entry, LedgerError> {
        self.append_at(description, amount, Utc::now())
    }

    pub fn append_at(
        &mut self,
        description: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<&Entry, LedgerError> {
        if description.trim().is_empty() {
            return Err(LedgerError::EmptyDescription);
        }
        if !amount.is_finite() {
            return Err(LedgerError::NonFiniteAmount(amount));
        }
        if amount.abs() > MAX_AMOUNT as f64 {
            return Err(LedgerError::AmountOutOfRange(amount));
        }
        let amount_decimal =
            Decimal::from_f64(amount).ok_or(LedgerError::AmountOutOfRange(amount))?;

        let entry = Entry::new_derived(
            self.entries.len() as u64,
            timestamp,
            description,
            amount_decimal,
            self.last().content_hash(),
        );
        debug!(
            index = entry.sequence_number(),
            hash = entry.content_hash(),
            "appended entry"
        );
        self.entries.push(entry);
        Ok(self.last())
    }

    /// Checks the whole chain with default options.
    pub fn verify(&self) -> bool {
        self.verify_with(VerifyOptions::default()).is_valid()
    }

    /// Scans the whole chain and reports every fault found.
    pub fn verify_with(&self, options: VerifyOptions) -> Verification {
        let verification = verify::scan(&self.entries, options);
        for fault in verification.faults() {
            warn!(index = fault.index, kind = ?fault.kind, "ledger integrity fault");
        }
        verification
    }

    /// Sum of all amounts after genesis, accumulated in index order.
    ///
    /// Every amount is bounded by [`MAX_AMOUNT`], so the sum cannot overflow.
    pub fn balance(&self) -> Decimal {
        self.transactions()
            .iter()
            .fold(Decimal::ZERO, |sum, entry| sum + entry.amount())
    }

    /// Throws away all history and starts over from a new genesis entry.
    pub fn reset(&mut self) {
        self.reset_at(Utc::now());
    }

    pub fn reset_at(&mut self, timestamp: DateTime<Utc>) {
        debug!(discarded = self.entries.len(), "resetting ledger");
        *self = Self::create_at(timestamp);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Every entry except genesis.
    pub fn transactions(&self) -> &[Entry] {
        &self.entries[1..]
    }

    pub fn genesis(&self) -> &Entry {
        &self.entries[0]
    }

    pub fn last(&self) -> &Entry {
        // Never empty: every constructor installs a genesis entry
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }
}
