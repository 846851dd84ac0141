use chrono::NaiveDate;

/// Date format used for the `date` column and for user input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One persisted daily bar (OHLCV data).
#[derive(Debug, Clone, PartialEq)]
pub struct StockBar {
    pub id: i64,        // Surrogate key assigned by the store.
    pub symbol: String, // Uppercase ticker.
    pub date: String,   // YYYY-MM-DD.
    pub open: f64,      // Opening price.
    pub high: f64,      // Highest price.
    pub low: f64,       // Lowest price.
    pub close: f64,     // Closing price.
    pub volume: i64,    // Trading volume.
}

/// One row of a fetch result. Any value can be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// Values of a row that can be stored: open, high, low, close, volume.
pub type CompleteRow = (f64, f64, f64, f64, i64);

impl FetchedRow {
    /// Returns the OHLCV values when none of them is missing.
    pub fn complete(&self) -> Option<CompleteRow> {
        Some((self.open?, self.high?, self.low?, self.close?, self.volume?))
    }

    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Daily bars for one symbol as returned by the market data provider, in date order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub symbol: String,
    pub rows: Vec<FetchedRow>,
}

impl PriceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of inserting a fetched table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertReport {
    pub inserted: usize,
    pub skipped: Vec<String>, // Dates of rows dropped for missing values.
}
