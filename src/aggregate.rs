use std::{
    collections::{hash_map::Entry, HashMap},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use log::{debug, error};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::Error,
    partner::{PartnerConfig, PartnerRegistry},
    scanner::{scan, statement_period, CustomerBlock},
    table::{Cell, SheetLayout, Table, DATE_FORMAT},
    transaction::{CustomerKey, TransactionRecord},
    workbook,
};

/// Everything one cardholder spent at one merchant.
/// `total_spent` is always the sum of `transactions`, in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAggregate {
    pub key: CustomerKey,
    total_spent: Decimal,
    trans_count: usize,
    transactions: Vec<TransactionRecord>,
}

impl CustomerAggregate {
    pub fn new(key: CustomerKey) -> Self {
        Self {
            key,
            total_spent: Decimal::ZERO,
            trans_count: 0,
            transactions: Vec::new(),
        }
    }

    fn add(&mut self, record: TransactionRecord) {
        self.total_spent += record.amount;
        self.trans_count += 1;
        self.transactions.push(record);
    }

    pub fn total_spent(&self) -> Decimal {
        self.total_spent
    }

    pub fn trans_count(&self) -> usize {
        self.trans_count
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }
}

/// Per-merchant running totals. Customers are kept in the order they were
/// first seen across all files.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MerchantAggregate {
    customers: Vec<CustomerAggregate>,
    index: HashMap<CustomerKey, usize>,
    total_spent: Decimal,
    trans_count: usize,
}

impl MerchantAggregate {
    pub fn add(&mut self, key: CustomerKey, record: TransactionRecord) {
        self.total_spent += record.amount;
        self.trans_count += 1;
        let position = match self.index.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let position = self.customers.len();
                self.customers.push(CustomerAggregate::new(entry.key().clone()));
                entry.insert(position);
                position
            }
        };
        self.customers[position].add(record);
    }

    pub fn customers(&self) -> &[CustomerAggregate] {
        &self.customers
    }

    pub fn customer(&self, key: &CustomerKey) -> Option<&CustomerAggregate> {
        self.index.get(key).map(|&i| &self.customers[i])
    }

    pub fn total_spent(&self) -> Decimal {
        self.total_spent
    }

    pub fn trans_count(&self) -> usize {
        self.trans_count
    }
}

/// Earliest and latest statement dates seen so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    bounds: Option<(NaiveDate, NaiveDate)>,
}

impl DateRange {
    pub fn record(&mut self, date: NaiveDate) {
        self.bounds = Some(match self.bounds {
            None => (date, date),
            Some((start, end)) => (start.min(date), end.max(date)),
        });
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.bounds
    }
}

/// Parse the statement date out of the period header cell. Text cells must
/// end in a `MM/DD/YYYY` date; date cells are taken as they are.
pub fn parse_statement_period(label: &Cell) -> Result<NaiveDate, Error> {
    match label {
        Cell::Date(date) => Ok(*date),
        Cell::Text(text) => {
            let text = text.trim_end();
            let chars: Vec<char> = text.chars().collect();
            if chars.len() < 10 {
                return Err(Error::InvalidStatementPeriod(text.to_string()));
            }
            let tail: String = chars[chars.len() - 10..].iter().collect();
            NaiveDate::parse_from_str(&tail, DATE_FORMAT)
                .map_err(|_| Error::InvalidStatementPeriod(text.to_string()))
        }
        other => Err(Error::InvalidStatementPeriod(other.text())),
    }
}

#[derive(Debug, PartialEq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of a batch of input files.
#[derive(Debug, Default, PartialEq)]
pub struct IngestReport {
    pub processed: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct DumpRow<'a> {
    merchant: &'a str,
    cardholder: &'a str,
    card_last4: &'a str,
    trans_count: usize,
    total_spent: Decimal,
}

/// Accumulates every partner's spend across input files.
///
/// An empty aggregate exists for each partner from the start, so partners
/// with no matching transactions still show up in the results.
#[derive(Debug)]
pub struct Aggregator {
    registry: PartnerRegistry,
    layout: SheetLayout,
    merchants: HashMap<String, MerchantAggregate>,
    date_range: DateRange,
}

impl Aggregator {
    pub fn new(registry: PartnerRegistry, layout: SheetLayout) -> Self {
        let merchants = registry
            .iter()
            .map(|p| (p.appears_as.clone(), MerchantAggregate::default()))
            .collect();
        Self {
            registry,
            layout,
            merchants,
            date_range: DateRange::default(),
        }
    }

    /// Add a block's transactions to the aggregates. Rows for merchants that
    /// are not partners are skipped without converting them.
    ///
    /// Rows before a failing one stay merged.
    pub fn ingest_customer_block<T: Table>(&mut self, block: &CustomerBlock<T>) -> Result<(), Error> {
        for raw in block.transactions() {
            let merchant = raw.merchant_name();
            if !self.registry.contains(&merchant) {
                continue;
            }
            let record = raw.to_record()?;
            self.merchants
                .entry(merchant)
                .or_default()
                .add(block.key.clone(), record);
        }
        Ok(())
    }

    pub fn record_statement_period(&mut self, label: &Cell) -> Result<NaiveDate, Error> {
        let date = parse_statement_period(label)?;
        self.date_range.record(date);
        Ok(date)
    }

    /// Ingest every customer block of a data sheet, then its statement date.
    pub fn process_table<T: Table>(&mut self, table: &T) -> Result<(), Error> {
        let layout = self.layout;
        for block in scan(table, &layout) {
            self.ingest_customer_block(&block)?;
        }
        let date = self.record_statement_period(statement_period(table, &layout))?;
        debug!("statement period ends {}", date);
        Ok(())
    }

    pub fn process_file(&mut self, path: &Path) -> Result<(), Error> {
        let table = workbook::open_data_sheet(path, self.layout.data_sheet)?;
        self.process_table(&table)
    }

    /// Process files one after another. A failing file is logged and
    /// recorded; whatever it merged before failing is kept.
    pub fn process_files<P>(&mut self, paths: impl IntoIterator<Item = P>) -> IngestReport
    where
        P: AsRef<Path>,
    {
        let mut report = IngestReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.process_file(path) {
                Ok(()) => {
                    debug!("processed {}", path.display());
                    report.processed.push(path.to_path_buf());
                }
                Err(err) => {
                    error!("unable to process file: \"{}\": {}", file_label(path), err);
                    report.failures.push(FileFailure {
                        path: path.to_path_buf(),
                        error: err,
                    });
                }
            }
        }
        report
    }

    pub fn merchant(&self, appears_as: &str) -> Option<&MerchantAggregate> {
        self.merchants.get(appears_as)
    }

    /// Partners paired with their aggregates, in registry order.
    pub fn merchants(&self) -> impl Iterator<Item = (&PartnerConfig, &MerchantAggregate)> {
        self.registry
            .iter()
            .filter_map(move |p| self.merchants.get(&p.appears_as).map(|m| (p, m)))
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    /// Dump the aggregate state as CSV: one row per customer, then a
    /// merchant row with empty cardholder columns.
    pub fn serialize(&self, output: impl std::io::Write) -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = csv::Writer::from_writer(output);
        for (partner, merchant) in self.merchants() {
            for customer in merchant.customers() {
                writer.serialize(DumpRow {
                    merchant: &partner.appears_as,
                    cardholder: &customer.key.name,
                    card_last4: &customer.key.card_last4,
                    trans_count: customer.trans_count(),
                    total_spent: customer.total_spent(),
                })?;
            }
            writer.serialize(DumpRow {
                merchant: &partner.appears_as,
                cardholder: "",
                card_last4: "",
                trans_count: merchant.trans_count(),
                total_spent: merchant.total_spent(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
