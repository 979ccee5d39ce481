use std::ops::Range;

use crate::{
    error::Error,
    table::{Cell, Columns, SheetLayout, Table},
    transaction::{CustomerKey, TransactionRecord},
};

/// One transaction row as it sits in the sheet, before any conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTransaction<'t> {
    pub row: usize,
    pub merchant: &'t Cell,
    trans_date: &'t Cell,
    trans_time: &'t Cell,
    cleared_date: &'t Cell,
    amount: &'t Cell,
    columns: &'t Columns,
}

impl<'t> RawTransaction<'t> {
    fn read<T: Table>(table: &'t T, columns: &'t Columns, row: usize) -> Self {
        RawTransaction {
            row,
            merchant: table.cell(row, columns.merchant),
            trans_date: table.cell(row, columns.trans_date),
            trans_time: table.cell(row, columns.trans_time),
            cleared_date: table.cell(row, columns.cleared_date),
            amount: table.cell(row, columns.amount),
            columns,
        }
    }

    pub fn merchant_name(&self) -> String {
        self.merchant.text()
    }

    /// Convert the row into a record, failing on a non-numeric time or amount.
    pub fn to_record(&self) -> Result<TransactionRecord, Error> {
        let trans_time = self.trans_time.as_integer().ok_or_else(|| Error::InvalidCell {
            row: self.row,
            col: self.columns.trans_time,
            reason: format!("transaction time `{}` is not a number", self.trans_time.text()),
        })?;
        let amount = self.amount.as_decimal().ok_or_else(|| Error::InvalidCell {
            row: self.row,
            col: self.columns.amount,
            reason: format!("amount `{}` is not a number", self.amount.text()),
        })?;
        Ok(TransactionRecord {
            trans_date: self.trans_date.text(),
            trans_time,
            cleared_date: self.cleared_date.text(),
            amount,
        })
    }
}

/// The rows belonging to one cardholder: a header row carrying the name and
/// card number, followed by transaction rows up to the first blank merchant cell.
#[derive(Debug, Clone)]
pub struct CustomerBlock<'t, T: Table> {
    pub key: CustomerKey,
    pub header_row: usize,
    rows: Range<usize>,
    table: &'t T,
    columns: &'t Columns,
}

impl<'t, T: Table> CustomerBlock<'t, T> {
    pub fn transactions(&self) -> impl Iterator<Item = RawTransaction<'t>> + '_ {
        self.rows
            .clone()
            .map(move |row| RawTransaction::read(self.table, self.columns, row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lazily walks the customer blocks of a sheet.
///
/// The walk stops at the end of the table or at the first candidate header
/// row whose name cell is blank. No cell at or past `height()` is ever read.
pub struct CustomerBlocks<'t, T: Table> {
    table: &'t T,
    layout: &'t SheetLayout,
    next_row: usize,
    done: bool,
}

impl<'t, T: Table> Iterator for CustomerBlocks<'t, T> {
    type Item = CustomerBlock<'t, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let layout: &'t SheetLayout = self.layout;
        let columns = &layout.columns;
        let height = self.table.height();
        let header_row = self.next_row;
        if header_row >= height || self.table.cell(header_row, columns.customer_name).is_blank() {
            self.done = true;
            return None;
        }

        let mut end = header_row + 1;
        while end < height && !self.table.cell(end, columns.merchant).is_blank() {
            end += 1;
        }
        // `end` is the blank separator row; the next header follows it.
        self.next_row = end + 1;

        Some(CustomerBlock {
            key: CustomerKey::new(
                &self.table.cell(header_row, columns.customer_name).text(),
                &self.table.cell(header_row, columns.card_number).text(),
            ),
            header_row,
            rows: header_row + 1..end,
            table: self.table,
            columns,
        })
    }
}

pub fn scan<'t, T: Table>(table: &'t T, layout: &'t SheetLayout) -> CustomerBlocks<'t, T> {
    CustomerBlocks {
        table,
        layout,
        next_row: layout.first_data_row,
        done: false,
    }
}

/// The header cell whose text ends in the statement date.
pub fn statement_period<'t, T: Table>(table: &'t T, layout: &SheetLayout) -> &'t Cell {
    let (row, col) = layout.period_cell;
    table.cell(row, col)
}

#[cfg(test)]
mod tests {
    use crate::scanner::scan;
    use crate::table::{Cell, MemoryTable, SheetLayout};

    // Columns: name, card, date, time, cleared, merchant, amount
    fn layout() -> SheetLayout {
        let mut layout = SheetLayout::default();
        layout.period_cell = (0, 0);
        layout.first_data_row = 1;
        layout.columns.customer_name = 0;
        layout.columns.card_number = 1;
        layout.columns.trans_date = 2;
        layout.columns.trans_time = 3;
        layout.columns.cleared_date = 4;
        layout.columns.merchant = 5;
        layout.columns.amount = 6;
        layout
    }

    macro_rules! table {
        ($data:literal) => {{
            let rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader($data.as_bytes());
            MemoryTable::from_csv(rdr).unwrap()
        }};
    }

    #[test]
    fn blocks_and_transactions() {
        let table = table!(
            "Period ending 01/31/2021
            Jane Doe,XXXX1234,,,,,
            ,,01/02/2021,1015,01/03/2021,ACME,10.00
            ,,01/04/2021,1130,01/05/2021,OTHER,2.00
            ,,,,,,
            John Roe,XXXX9876,,,,,
            ,,01/05/2021,900,01/06/2021,ACME,3.50
            ,,,,,,"
        );
        let layout = layout();
        let blocks: Vec<_> = scan(&table, &layout).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].key.name, "Jane Doe");
        assert_eq!(blocks[0].key.card_last4, "1234");
        assert_eq!(blocks[0].len(), 2);
        let merchants: Vec<String> = blocks[0].transactions().map(|t| t.merchant_name()).collect();
        assert_eq!(merchants, vec!["ACME", "OTHER"]);
        assert_eq!(blocks[1].header_row, 5);
        assert_eq!(blocks[1].len(), 1);
    }

    #[test]
    fn stops_at_blank_name() {
        let table = table!(
            "header
            Jane Doe,1234,,,,,
            ,,d,1,c,ACME,1
            ,,,,,,
            ,,,,,,
            John Roe,9876,,,,,
            ,,d,1,c,ACME,1"
        );
        let layout = layout();
        assert_eq!(scan(&table, &layout).count(), 1);
    }

    #[test]
    fn never_reads_past_last_row() {
        // last block runs to the end of the table without a separator row
        let table = table!(
            "header
            Jane Doe,1234,,,,,
            ,,d,1,c,ACME,1
            ,,d,2,c,ACME,2"
        );
        let layout = layout();
        let blocks: Vec<_> = scan(&table, &layout).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].transactions().count(), 2);
    }

    #[test]
    fn customer_without_transactions() {
        let table = table!(
            "header
            Jane Doe,1234,,,,,
            ,,,,,,
            John Roe,9876,,,,,
            ,,d,1,c,ACME,1"
        );
        let layout = layout();
        let blocks: Vec<_> = scan(&table, &layout).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_empty());
        assert_eq!(blocks[1].len(), 1);
    }

    #[test]
    fn empty_sheet() {
        let table = MemoryTable::new(vec![vec![Cell::Text("header".to_string())]]);
        let layout = layout();
        assert_eq!(scan(&table, &layout).count(), 0);
    }

    #[test]
    fn invalid_amount_is_reported_with_position() {
        let table = table!(
            "header
            Jane Doe,1234,,,,,
            ,,d,1,c,ACME,lots"
        );
        let layout = layout();
        let block = scan(&table, &layout).next().unwrap();
        let err = block.transactions().next().unwrap().to_record().unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidCell { row: 2, col: 6, .. }));
    }
}
