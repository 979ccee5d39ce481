use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    aggregate::{DateRange, MerchantAggregate},
    partner::PartnerConfig,
    table::DATE_FORMAT,
    transaction::TransactionRecord,
};

pub const REPORT_TITLE: &str = "American River Gold Transaction Summarization and Invoice";

/// Flat fee added once to every invoice: $0.30.
pub const PROCESSING_FEE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

pub const COLUMN_HEADERS: [&str; 6] = [
    "Cardholder",
    "Card last 4",
    "Trans Date",
    "Trans Time",
    "Settled Date",
    "Amount",
];

/// Half-up rounding to cents.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `0.05` -> `"5"`, `0.025` -> `"2.5"`.
fn percent(rate: Decimal) -> String {
    (rate * Decimal::new(100, 0)).round_dp(2).normalize().to_string()
}

/// The charges billed to a merchant.
///
/// The customer discount and the ARG fee are both charges here and are added
/// together with the processing fee; nothing is subtracted. Each figure is
/// rounded on its own before the sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invoice {
    pub total_spent: Decimal,
    pub total_discount: Decimal,
    pub arg_fee: Decimal,
    pub processing_fee: Decimal,
    pub total_bill: Decimal,
}

impl Invoice {
    pub fn compute(total_spent: Decimal, partner: &PartnerConfig) -> Self {
        let total_discount = round_currency(total_spent * partner.customer_discount);
        let arg_fee = round_currency(total_spent * partner.arg_fee);
        Self {
            total_spent,
            total_discount,
            arg_fee,
            processing_fee: PROCESSING_FEE,
            total_bill: total_discount + arg_fee + PROCESSING_FEE,
        }
    }
}

/// A value placed in one report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Number(Decimal),
    Money(Decimal),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One line of a merchant report, independent of the output format.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRow {
    Title,
    Field { label: &'static str, value: String },
    Blank,
    ColumnHeaders,
    Customer { name: String, card_last4: String },
    Transaction(TransactionRecord),
    CustomerTotal(Decimal),
    CustomerDiscount { rate: Decimal, amount: Decimal },
    TotalSpent(Decimal),
    TotalDiscount { rate: Decimal, amount: Decimal },
    ArgFee { rate: Decimal, amount: Decimal },
    ProcessingFee(Decimal),
    TotalBill(Decimal),
}

impl ReportRow {
    /// `(column, value)` pairs this row occupies.
    pub fn cells(&self) -> Vec<(u16, Value)> {
        match self {
            ReportRow::Title => vec![(0, REPORT_TITLE.into())],
            ReportRow::Field { label, value } => vec![(0, (*label).into()), (1, Value::Text(value.clone()))],
            ReportRow::Blank => vec![],
            ReportRow::ColumnHeaders => COLUMN_HEADERS
                .iter()
                .enumerate()
                .map(|(col, header)| (col as u16, (*header).into()))
                .collect(),
            ReportRow::Customer { name, card_last4 } => vec![
                (0, Value::Text(name.clone())),
                (1, Value::Text(card_last4.clone())),
            ],
            ReportRow::Transaction(t) => vec![
                (2, Value::Text(t.trans_date.clone())),
                (3, Value::Integer(t.trans_time)),
                (4, Value::Text(t.cleared_date.clone())),
                (5, Value::Money(t.amount)),
            ],
            ReportRow::CustomerTotal(total) => vec![(4, "Total:".into()), (5, Value::Money(*total))],
            ReportRow::CustomerDiscount { rate, amount } => vec![
                (4, Value::Text(format!("discount ({}%):", percent(*rate)))),
                (5, Value::Money(*amount)),
            ],
            ReportRow::TotalSpent(total) => vec![(0, "Total Spent:".into()), (1, Value::Number(*total))],
            ReportRow::TotalDiscount { rate, amount } => vec![
                (0, Value::Text(format!("Total Discount ({}%):", percent(*rate)))),
                (1, Value::Money(*amount)),
            ],
            ReportRow::ArgFee { rate, amount } => vec![
                (0, Value::Text(format!("ARG fee ({}%):", percent(*rate)))),
                (1, Value::Money(*amount)),
            ],
            ReportRow::ProcessingFee(fee) => vec![(0, "Processing fee:".into()), (1, Value::Money(*fee))],
            ReportRow::TotalBill(total) => vec![(0, "Total bill:".into()), (1, Value::Money(*total))],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Output file name without extension.
    pub file_stem: String,
    pub rows: Vec<ReportRow>,
    pub invoice: Invoice,
}

impl Report {
    /// Amounts of the per-customer discount rows, in report order.
    pub fn customer_discounts(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.rows.iter().filter_map(|row| match row {
            ReportRow::CustomerDiscount { amount, .. } => Some(*amount),
            _ => None,
        })
    }
}

/// `{retailer}_summary_{start:YYYYMMDD}_{end:YYYYMMDD}`; `unknown` stands in
/// for both dates when no statement period was ever read.
pub fn file_stem(partner: &PartnerConfig, range: DateRange) -> String {
    let (start, end) = match range.bounds() {
        Some((start, end)) => (
            start.format("%Y%m%d").to_string(),
            end.format("%Y%m%d").to_string(),
        ),
        None => ("unknown".to_string(), "unknown".to_string()),
    };
    format!("{}_summary_{}_{}", partner.retailer_name, start, end)
}

fn period(range: DateRange) -> String {
    match range.bounds() {
        Some((start, end)) => format!("{} - {}", start.format(DATE_FORMAT), end.format(DATE_FORMAT)),
        None => String::new(),
    }
}

/// Lay out one merchant's report: header, one block per customer, footer.
pub fn compose(partner: &PartnerConfig, merchant: &MerchantAggregate, range: DateRange) -> Report {
    let mut rows = vec![
        ReportRow::Title,
        ReportRow::Field {
            label: "Merchant Name:",
            value: partner.retailer_name.clone(),
        },
        ReportRow::Field {
            label: "Appears As:",
            value: partner.appears_as.clone(),
        },
        ReportRow::Field {
            label: "Contact:",
            value: partner.contact_name.clone(),
        },
        ReportRow::Field {
            label: "Phone:",
            value: partner.contact_phone.clone(),
        },
        ReportRow::Field {
            label: "Email:",
            value: partner.contact_email.clone(),
        },
        ReportRow::Field {
            label: "Period:",
            value: period(range),
        },
        ReportRow::Blank,
        ReportRow::ColumnHeaders,
    ];

    for customer in merchant.customers() {
        rows.push(ReportRow::Customer {
            name: customer.key.name.clone(),
            card_last4: customer.key.card_last4.clone(),
        });
        rows.extend(customer.transactions().iter().cloned().map(ReportRow::Transaction));
        rows.push(ReportRow::CustomerTotal(customer.total_spent()));
        rows.push(ReportRow::CustomerDiscount {
            rate: partner.customer_discount,
            amount: round_currency(customer.total_spent() * partner.customer_discount),
        });
        rows.push(ReportRow::Blank);
    }

    let invoice = Invoice::compute(merchant.total_spent(), partner);
    rows.extend([
        ReportRow::TotalSpent(invoice.total_spent),
        ReportRow::TotalDiscount {
            rate: partner.customer_discount,
            amount: invoice.total_discount,
        },
        ReportRow::ArgFee {
            rate: partner.arg_fee,
            amount: invoice.arg_fee,
        },
        ReportRow::ProcessingFee(invoice.processing_fee),
        ReportRow::Blank,
        ReportRow::TotalBill(invoice.total_bill),
    ]);

    Report {
        file_stem: file_stem(partner, range),
        rows,
        invoice,
    }
}
