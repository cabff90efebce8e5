use std::fmt;

use crate::entry::{Entry, GENESIS_PREVIOUS_HASH};

/// Knobs for chain verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Also recompute the genesis entry's hash and require the sentinel
    /// previous hash. When false, index 0 is not inspected at all.
    pub check_genesis: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            check_genesis: true,
        }
    }
}

/// What went wrong at one position of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Stored hash differs from the one derived from the entry's fields.
    HashMismatch,
    /// Previous hash differs from the predecessor's stored hash.
    BrokenLink,
    /// Sequence number differs from the entry's position.
    SequenceMismatch,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::HashMismatch => write!(f, "content hash does not match its fields"),
            FaultKind::BrokenLink => write!(f, "previous hash does not match the prior entry"),
            FaultKind::SequenceMismatch => write!(f, "sequence number does not match its position"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainFault {
    pub index: usize,
    pub kind: FaultKind,
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain invalid at entry {}: {}", self.index, self.kind)
    }
}

/// Outcome of a full chain scan, faults in index-ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    faults: Vec<ChainFault>,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn faults(&self) -> &[ChainFault] {
        &self.faults
    }

    pub fn first_fault(&self) -> Option<&ChainFault> {
        self.faults.first()
    }
}

/// Scans every entry, collecting all faults.
pub(super) fn scan(entries: &[Entry], options: VerifyOptions) -> Verification {
    let mut faults = Vec::new();
    let mut push = |index, kind| faults.push(ChainFault { index, kind });

    if options.check_genesis {
        if let Some(genesis) = entries.first() {
            check_own_fields(0, genesis, &mut push);
            if genesis.previous_hash() != GENESIS_PREVIOUS_HASH {
                push(0, FaultKind::BrokenLink);
            }
        }
    }

    for (index, pair) in entries.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = index + 1;
        check_own_fields(index, current, &mut push);
        if current.previous_hash() != previous.content_hash() {
            push(index, FaultKind::BrokenLink);
        }
    }

    Verification { faults }
}

fn check_own_fields(index: usize, entry: &Entry, push: &mut impl FnMut(usize, FaultKind)) {
    if entry.sequence_number() != index as u64 {
        push(index, FaultKind::SequenceMismatch);
    }
    if !entry.recompute_and_check() {
        push(index, FaultKind::HashMismatch);
    }
}
