use crate::{
    marketdata::api_caller::DailyBarSource,
    model,
    store::sqlite::{Store, StoreError},
};
use thiserror::Error;

/// Input problems caught before the fetcher or the store is touched.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Please enter a stock symbol!")]
    MissingSymbol,
    #[error("Please fill all fields for update!")]
    MissingUpdateFields,
    #[error("Please enter symbol and date to delete!")]
    MissingDeleteFields,
    #[error("Invalid price! Please enter a numeric value.")]
    InvalidPrice(String),
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning,
    Info,
}

/// Result of one user action, rendered by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Added {
        symbol: String,
        inserted: usize,
        skipped: Vec<String>,
    },
    FetchUnavailable {
        symbol: String,
    },
    Listing(Vec<model::StockBar>),
    Updated {
        symbol: String,
        date: String,
        close: f64,
        rows: usize,
    },
    Deleted {
        symbol: String,
        date: String,
        rows: usize,
    },
    NotFound {
        symbol: String,
        date: String,
    },
}

impl Report {
    pub fn status(&self) -> Status {
        match self {
            Report::Added { .. } | Report::Updated { .. } | Report::Deleted { .. } => {
                Status::Success
            }
            Report::FetchUnavailable { .. } => Status::Warning,
            Report::Listing(rows) if rows.is_empty() => Status::Warning,
            Report::Listing(_) | Report::NotFound { .. } => Status::Info,
        }
    }

    /// Rows written, changed or removed by the action.
    pub fn rows_affected(&self) -> usize {
        match self {
            Report::Added { inserted, .. } => *inserted,
            Report::Updated { rows, .. } | Report::Deleted { rows, .. } => *rows,
            Report::FetchUnavailable { .. } | Report::Listing(_) | Report::NotFound { .. } => 0,
        }
    }
}

/// Turns raw form fields into fetcher and store calls.
pub struct Controller<S> {
    store: Store,
    source: S,
}

impl<S: DailyBarSource> Controller<S> {
    pub fn new(store: Store, source: S) -> Self {
        Self { store, source }
    }

    /// Fetches the recent window for a symbol and stores its complete rows.
    pub async fn add(&self, symbol: &str) -> Result<Report, ActionError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(ValidationError::MissingSymbol.into());
        }

        let Some(table) = self.source.fetch(&symbol).await else {
            return Ok(Report::FetchUnavailable { symbol });
        };

        let report = self.store.insert_bars(&table)?;
        Ok(Report::Added {
            symbol,
            inserted: report.inserted,
            skipped: report.skipped,
        })
    }

    pub fn view(&self) -> Result<Report, ActionError> {
        Ok(Report::Listing(self.store.list_all()?))
    }

    pub fn update(&self, symbol: &str, date: &str, price: &str) -> Result<Report, ActionError> {
        let symbol = normalize_symbol(symbol);
        let date = date.trim();
        let price = price.trim();
        if symbol.is_empty() || date.is_empty() || price.is_empty() {
            return Err(ValidationError::MissingUpdateFields.into());
        }
        let close = parse_price(price)?;

        let rows = self.store.update_close(&symbol, date, close)?;
        if rows == 0 {
            return Ok(Report::NotFound {
                symbol,
                date: date.into(),
            });
        }
        Ok(Report::Updated {
            symbol,
            date: date.into(),
            close,
            rows,
        })
    }

    pub fn delete(&self, symbol: &str, date: &str) -> Result<Report, ActionError> {
        let symbol = normalize_symbol(symbol);
        let date = date.trim();
        if symbol.is_empty() || date.is_empty() {
            return Err(ValidationError::MissingDeleteFields.into());
        }

        let rows = self.store.delete(&symbol, date)?;
        if rows == 0 {
            return Ok(Report::NotFound {
                symbol,
                date: date.into(),
            });
        }
        Ok(Report::Deleted {
            symbol,
            date: date.into(),
            rows,
        })
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn parse_price(price: &str) -> Result<f64, ValidationError> {
    match price.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::InvalidPrice(price.into())),
    }
}
