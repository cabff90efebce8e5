use std::io::sink;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;

use super::{AMOUNT_SCALE, GENESIS_PREVIOUS_HASH};

/// One transaction in the ledger chain.
///
/// The content hash binds the other five fields together. It is computed once
/// by [`Entry::new_derived`], or taken on trust by [`Entry::from_stored`], and
/// only ever re-derived on demand by [`Entry::recompute_and_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    sequence_number: u64,
    timestamp: DateTime<Utc>,
    description: String,
    amount: Decimal,
    previous_hash: String,
    content_hash: String,
}

impl Entry {
    /// Builds a new entry and derives its content hash.
    ///
    /// The timestamp is truncated to microseconds and the amount rounded to
    /// [`AMOUNT_SCALE`] places, the precision both are persisted at.
    pub fn new_derived(
        sequence_number: u64,
        timestamp: DateTime<Utc>,
        description: &str,
        amount: Decimal,
        previous_hash: &str,
    ) -> Self {
        let mut entry = Entry {
            sequence_number,
            timestamp: timestamp.trunc_subsecs(6),
            description: description.to_string(),
            amount: amount.round_dp(AMOUNT_SCALE).normalize(),
            previous_hash: previous_hash.to_string(),
            content_hash: String::new(),
        };
        entry.content_hash = entry.compute_hash();
        entry
    }

    /// Rebuilds an entry from persisted fields, trusting the stored hash.
    pub fn from_stored(
        sequence_number: u64,
        timestamp: DateTime<Utc>,
        description: &str,
        amount: Decimal,
        previous_hash: &str,
        content_hash: &str,
    ) -> Self {
        Entry {
            sequence_number,
            timestamp,
            description: description.to_string(),
            amount,
            previous_hash: previous_hash.to_string(),
            content_hash: content_hash.to_string(),
        }
    }

    /// Derives the hash from the current fields.
    pub fn compute_hash(&self) -> String {
        self.write_canonical(sink()).expect("Writing to a sink does not fail")
    }

    /// True when the stored hash matches the one derived from the fields.
    pub fn recompute_and_check(&self) -> bool {
        self.compute_hash() == self.content_hash
    }

    pub fn is_genesis(&self) -> bool {
        self.sequence_number == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// First eight hex characters of the content hash.
    pub fn short_hash(&self) -> &str {
        let end = self.content_hash.len().min(8);
        self.content_hash.get(..end).unwrap_or(&self.content_hash)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use rust_decimal_macros::dec;

    use super::*;

    #[derive(Clone, Debug)]
    struct Fields {
        sequence_number: u64,
        timestamp: DateTime<Utc>,
        description: String,
        amount: Decimal,
        previous_hash: String,
    }

    impl Arbitrary for Fields {
        fn arbitrary(g: &mut Gen) -> Self {
            let secs = i64::from(u32::arbitrary(g));
            let micros = u32::arbitrary(g) % 1_000_000;
            Fields {
                sequence_number: u64::arbitrary(g) % 1_000_000,
                timestamp: Utc
                    .timestamp_opt(secs, micros * 1_000)
                    .single()
                    .unwrap_or_default(),
                description: String::arbitrary(g),
                amount: Decimal::new(i64::from(i32::arbitrary(g)), 2),
                previous_hash: hex::encode(Vec::<u8>::arbitrary(g)),
            }
        }
    }

    impl Fields {
        fn derive(&self) -> Entry {
            Entry::new_derived(
                self.sequence_number,
                self.timestamp,
                &self.description,
                self.amount,
                &self.previous_hash,
            )
        }
    }

    #[quickcheck]
    fn derived_hash_is_pure(fields: Fields) -> bool {
        let entry = fields.derive();
        entry.recompute_and_check() && entry.compute_hash() == fields.derive().content_hash
    }

    #[quickcheck]
    fn stored_entry_trusts_hash(fields: Fields) -> bool {
        let entry = fields.derive();
        let stored = Entry::from_stored(
            entry.sequence_number(),
            entry.timestamp(),
            entry.description(),
            entry.amount(),
            entry.previous_hash(),
            entry.content_hash(),
        );
        stored == entry && stored.recompute_and_check()
    }

    #[quickcheck]
    fn changed_amount_changes_hash(fields: Fields) -> bool {
        let entry = fields.derive();
        let tampered = Entry::from_stored(
            entry.sequence_number(),
            entry.timestamp(),
            entry.description(),
            entry.amount() + dec!(0.01),
            entry.previous_hash(),
            entry.content_hash(),
        );
        !tampered.recompute_and_check()
    }

    #[test]
    fn hash_is_hex_sha256() {
        let entry = Entry::new_derived(1, Utc::now(), "rent", dec!(-500), "0");
        assert_eq!(entry.content_hash().len(), 64);
        assert!(entry.content_hash().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(entry.short_hash().len(), 8);
        assert!(entry.content_hash().starts_with(entry.short_hash()));
    }

    #[test]
    fn construction_pins_precision() {
        let timestamp = Utc
            .with_ymd_and_hms(2025, 5, 1, 12, 0, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        let entry = Entry::new_derived(3, timestamp, "coffee", dec!(-3.123456789), "ab");
        assert_eq!(entry.timestamp().nanosecond(), 123_456_000);
        assert_eq!(entry.amount(), dec!(-3.12345679));
    }

    #[test]
    fn equal_amounts_at_different_scale_hash_alike() {
        let timestamp = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let a = Entry::new_derived(1, timestamp, "salary", dec!(2000), "ab");
        let b = Entry::new_derived(1, timestamp, "salary", dec!(2000.00), "ab");
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn sub_micro_edits_change_hash() {
        let timestamp = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let entry = Entry::new_derived(1, timestamp, "rent", dec!(-500), "ab");
        let nudged_time = Entry::from_stored(
            1,
            timestamp.with_nanosecond(1).unwrap(),
            "rent",
            dec!(-500),
            "ab",
            entry.content_hash(),
        );
        let nudged_amount = Entry::from_stored(
            1,
            timestamp,
            "rent",
            dec!(-500.000000001),
            "ab",
            entry.content_hash(),
        );
        assert!(entry.recompute_and_check());
        assert!(!nudged_time.recompute_and_check());
        assert!(!nudged_amount.recompute_and_check());
    }

    #[test]
    fn genesis_detection() {
        let genesis = Entry::new_derived(0, Utc::now(), "Genesis Block", Decimal::ZERO, "0");
        let next = Entry::new_derived(1, Utc::now(), "x", dec!(1), genesis.content_hash());
        assert!(genesis.is_genesis());
        assert!(!next.is_genesis());
    }
}
