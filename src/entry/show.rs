use rust_decimal::Decimal;

use super::{Entry, canonical_timestamp};

/// Formats an amount with two decimals, the way balances are shown.
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    if amount.is_zero() {
        amount = Decimal::ZERO;
    }
    amount.rescale(2);
    amount.to_string()
}

impl Entry {
    /// Prints the Entry on one line, used in log.
    ///
    /// Example:
    ///
    /// 1  2025-05-01T12:00:00.000000Z  rent     -500.00  3f9a0c1e
    ///
    pub fn show_row(&self) -> String {
        format!(
            "{:>5}  {}  {:<24} {:>12}  {}",
            self.sequence_number(),
            canonical_timestamp(&self.timestamp()),
            self.description(),
            format_amount(self.amount()),
            self.short_hash(),
        )
    }

    /// Prints every field of the Entry, one per line.
    pub fn show_long(&self) -> String {
        let mut result = String::new();
        result.push_str(&format!("index:         {}\n", self.sequence_number()));
        result.push_str(&format!(
            "timestamp:     {}\n",
            canonical_timestamp(&self.timestamp())
        ));
        result.push_str(&format!("description:   {}\n", self.description()));
        result.push_str(&format!("amount:        {}\n", self.amount()));
        result.push_str(&format!("previous hash: {}\n", self.previous_hash()));
        result.push_str(&format!("hash:          {}\n", self.content_hash()));
        result
    }
}
