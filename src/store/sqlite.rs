use super::stock;
use crate::model;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("fail to open sqlite file {}. {}", .0.display(), .1)]
    Open(PathBuf, rusqlite::Error),
    #[error("fail to execute PRAGMA journal_mode=WAL. {0}")]
    JournalMode(rusqlite::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub fn init_sqlite_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )
    .map_err(|e| StoreError::Open(path.to_path_buf(), e))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_row| Ok(()))
        .map_err(StoreError::JournalMode)?;
    Ok(conn)
}

/// Handle to the stock database file.
///
/// Every operation opens its own connection and drops it before returning, on success and on error.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_connection<T>(
        &self,
        work: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut conn = init_sqlite_connection(&self.path)?;
        Ok(work(&mut conn)?)
    }

    /// Creates the stocks table if it does not exist yet.
    pub fn ensure_schema(&self) -> Result<()> {
        self.with_connection(|conn| stock::create_table(conn))?;
        log::debug!("Stocks table ready in {}", self.path.display());
        Ok(())
    }

    pub fn insert_bars(&self, table: &model::PriceTable) -> Result<model::InsertReport> {
        let report = self.with_connection(|conn| stock::insert_bars(conn, table))?;
        log::info!(
            "Saved {} rows for {}, skipped {}",
            report.inserted,
            table.symbol,
            report.skipped.len()
        );
        Ok(report)
    }

    pub fn list_all(&self) -> Result<Vec<model::StockBar>> {
        self.with_connection(|conn| stock::list_all(conn))
    }

    pub fn update_close(&self, symbol: &str, date: &str, close: f64) -> Result<usize> {
        let changed = self.with_connection(|conn| stock::update_close(conn, symbol, date, close))?;
        log::debug!("Updated close of {} rows for {} {}", changed, symbol, date);
        Ok(changed)
    }

    pub fn delete(&self, symbol: &str, date: &str) -> Result<usize> {
        let removed = self.with_connection(|conn| stock::delete(conn, symbol, date))?;
        log::debug!("Deleted {} rows for {} {}", removed, symbol, date);
        Ok(removed)
    }
}
