use std::io::{Result, Write};

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use rust_decimal::Decimal;

use super::{AMOUNT_SCALE, Entry};
use crate::hash_writer::HashWriter;

impl Entry {
    /// Write the canonical hash preimage of an entry
    ///
    /// Returns the hex SHA-256 digest of the bytes written.
    ///
    /// +----------------------------+------------------------------------------+
    /// | sequence_number (8 B, LE)  | ts_len (4 B, LE) | timestamp (RFC 3339)  |
    /// +----------------------------+------------------------------------------+
    /// | desc_len (4 B, LE)         | description data (variable length)       |
    /// +----------------------------+------------------------------------------+
    /// | amount_len (4 B, LE)       | amount text, 8+ fractional digits     |
    /// +----------------------------+------------------------------------------+
    /// | prev_len (4 B, LE)         | previous_hash (ASCII)                    |
    /// +----------------------------+------------------------------------------+
    ///
    /// Timestamps are UTC with microsecond precision and a `Z` suffix, e.g.
    /// `2025-05-01T12:00:00.000000Z`. Stored values finer than the pinned
    /// precision are written out in full so they never hash like a rounded value.
    pub fn write_canonical<W: Write>(&self, output: W) -> Result<String> {
        let mut output = HashWriter::new(output);

        output.write_all(&self.sequence_number().to_le_bytes())?;
        write_text(&mut output, &canonical_timestamp(&self.timestamp()))?;
        write_text(&mut output, self.description())?;
        write_text(&mut output, &canonical_amount(self.amount()))?;
        write_text(&mut output, self.previous_hash())?;

        output.flush()?;
        let (_, hash) = output.finish();
        Ok(hash)
    }
}

fn write_text<W: Write>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(&(text.len() as u32).to_le_bytes())?;
    output.write_all(text.as_bytes())
}

pub(crate) fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    let format = if timestamp.nanosecond() % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    };
    timestamp.to_rfc3339_opts(format, true)
}

pub(crate) fn canonical_amount(amount: Decimal) -> String {
    // normalize also turns -0 into 0
    let mut amount = amount.normalize();
    if amount.scale() <= AMOUNT_SCALE {
        amount.rescale(AMOUNT_SCALE);
    }
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn amount_text_is_fixed_precision() {
        assert_eq!(canonical_amount(dec!(1500)), "1500.00000000");
        assert_eq!(canonical_amount(dec!(-500.5)), "-500.50000000");
        assert_eq!(canonical_amount(dec!(0.12345678)), "0.12345678");
        assert_eq!(canonical_amount(dec!(0.123456789)), "0.123456789");
        assert_eq!(canonical_amount(-Decimal::ZERO), "0.00000000");
    }

    #[test]
    fn timestamp_text_is_utc_micros() {
        let timestamp = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(canonical_timestamp(&timestamp), "2025-05-01T12:00:00.000000Z");
        let finer = timestamp.with_nanosecond(1_500).unwrap();
        assert_eq!(canonical_timestamp(&finer), "2025-05-01T12:00:00.000001500Z");
    }

    #[test]
    fn preimage_layout() -> Result<()> {
        let timestamp = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let entry = Entry::from_stored(2, timestamp, "rent", dec!(-500), "ab", "");
        let mut buf = Vec::new();
        let hash = entry.write_canonical(&mut buf)?;

        let mut expected = Vec::new();
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(&27u32.to_le_bytes());
        expected.extend_from_slice(b"2025-05-01T12:00:00.000000Z");
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"rent");
        expected.extend_from_slice(&13u32.to_le_bytes());
        expected.extend_from_slice(b"-500.00000000");
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"ab");
        assert_eq!(buf, expected);
        assert_eq!(hash, entry.compute_hash());
        Ok(())
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let timestamp = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let a = Entry::new_derived(1, timestamp, "ab", dec!(1), "cd");
        let b = Entry::new_derived(1, timestamp, "a", dec!(1), "bcd");
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
