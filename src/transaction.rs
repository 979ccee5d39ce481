use rust_decimal::Decimal;

/// Identifies a cardholder within one merchant's aggregate.
///
/// Only the last four card digits take part, so two cards sharing a holder
/// name and last four digits collapse into a single customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerKey {
    pub name: String,
    pub card_last4: String,
}

impl CustomerKey {
    /// Build a key from the raw header cells: the name is trimmed and the
    /// card number cut down to its last four characters.
    pub fn new(name: &str, card_number: &str) -> Self {
        let card_number = card_number.trim();
        let skip = card_number.chars().count().saturating_sub(4);
        Self {
            name: name.trim().to_string(),
            card_last4: card_number.chars().skip(skip).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub trans_date: String,
    pub trans_time: i64,
    pub cleared_date: String,
    pub amount: Decimal,
}
