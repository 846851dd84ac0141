use super::super::model;
use rusqlite::{params, Connection, Result};

/// Initializes the stocks table in the SQLite database.
///
/// There is deliberately no unique index on (symbol, date): adding the same window twice
/// appends duplicate rows, and update/delete then act on every match.
pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS stocks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            symbol TEXT NOT NULL,
            date TEXT NOT NULL,
            open_price REAL NOT NULL,
            high_price REAL NOT NULL,
            low_price REAL NOT NULL,
            close_price REAL NOT NULL,
            volume INTEGER NOT NULL
        );",
        [],
    )?;
    Ok(())
}

/// Saves the complete rows of a fetched table in one transaction, skipping rows with missing values.
pub fn insert_bars(
    conn: &mut Connection,
    table: &model::PriceTable,
) -> Result<model::InsertReport> {
    let mut report = model::InsertReport::default();
    let transaction = conn.transaction()?;
    {
        let mut stmt = transaction.prepare(
            "INSERT INTO stocks (symbol, date, open_price, high_price, low_price, close_price, volume)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in &table.rows {
            let date = row.date_string();
            let Some((open, high, low, close, volume)) = row.complete() else {
                log::warn!("{} {} has missing data, skipped", table.symbol, date);
                report.skipped.push(date);
                continue;
            };
            stmt.execute(params![table.symbol, date, open, high, low, close, volume])?;
            report.inserted += 1;
        }
    }
    transaction.commit()?;
    Ok(report)
}

/// Retrieves every row in insertion order.
pub fn list_all(conn: &Connection) -> Result<Vec<model::StockBar>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, date, open_price, high_price, low_price, close_price, volume
         FROM stocks ORDER BY id",
    )?;
    let bars = stmt.query_map([], |row| {
        Ok(model::StockBar {
            id: row.get(0)?,
            symbol: row.get(1)?,
            date: row.get(2)?,
            open: row.get(3)?,
            high: row.get(4)?,
            low: row.get(5)?,
            close: row.get(6)?,
            volume: row.get(7)?,
        })
    })?;
    bars.collect()
}

/// Sets the close price of every row matching symbol and date. Returns the number of rows changed.
pub fn update_close(conn: &Connection, symbol: &str, date: &str, close: f64) -> Result<usize> {
    conn.execute(
        "UPDATE stocks SET close_price = ?1 WHERE symbol = ?2 AND date = ?3",
        params![close, symbol, date],
    )
}

/// Removes every row matching symbol and date. Returns the number of rows removed.
pub fn delete(conn: &Connection, symbol: &str, date: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM stocks WHERE symbol = ?1 AND date = ?2",
        params![symbol, date],
    )
}
