use std::io::{self, BufRead, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::{
    controller::{ActionError, Controller, Report},
    marketdata::api_caller::DailyBarSource,
    model,
};

const MENU: &str = "\n[1] Add Stock  [2] View Stocks  [3] Update Stock  [4] Delete Stock  [5] Exit\n";

/// One user request, from the menu or from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add {
        symbol: String,
    },
    View,
    Update {
        symbol: String,
        date: String,
        price: String,
    },
    Delete {
        symbol: String,
        date: String,
    },
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Choice {
    Add,
    View,
    Update,
    Delete,
    Exit,
}

fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim().to_lowercase().as_str() {
        "1" | "add" => Some(Choice::Add),
        "2" | "view" => Some(Choice::View),
        "3" | "update" => Some(Choice::Update),
        "4" | "delete" => Some(Choice::Delete),
        "5" | "exit" | "quit" | "q" => Some(Choice::Exit),
        _ => None,
    }
}

/// Renders a report as output log lines.
pub fn render(report: &Report) -> Vec<String> {
    match report {
        Report::Added {
            symbol, skipped, ..
        } => {
            let mut lines: Vec<String> = skipped
                .iter()
                .map(|date| format!("⚠️ {} {} has missing data, skipped!", symbol, date))
                .collect();
            lines.push(format!("✅ Stock {} data successfully added!", symbol));
            lines
        }
        Report::FetchUnavailable { symbol } => vec![format!(
            "⚠️ Unable to fetch data for {} or invalid symbol!",
            symbol
        )],
        Report::Listing(rows) if rows.is_empty() => vec!["⚠️ No stock data available!".into()],
        Report::Listing(rows) => render_listing(rows),
        Report::Updated {
            symbol,
            date,
            close,
            ..
        } => vec![format!(
            "✅ {} {} close price updated to {}!",
            symbol,
            date,
            format_price(*close)
        )],
        Report::Deleted { symbol, date, .. } => {
            vec![format!("✅ {} {} data deleted!", symbol, date)]
        }
        Report::NotFound { symbol, date } => {
            vec![format!("⚠️ No data found for {} on {}!", symbol, date)]
        }
    }
}

// Prints whole prices with a trailing ".0" so 150 reads as a price, not a count.
fn format_price(price: f64) -> String {
    let text = price.to_string();
    if price.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

fn render_listing(rows: &[model::StockBar]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push("ID | Symbol | Date       | Open   | High   | Low    | Close  | Volume".into());
    lines.push("-".repeat(80));
    for row in rows {
        lines.push(format!(
            "{:<3} | {:<6} | {:<10} | {:<6.2} | {:<6.2} | {:<6.2} | {:<6.2} | {:<10}",
            row.id, row.symbol, row.date, row.open, row.high, row.low, row.close, row.volume
        ));
    }
    lines
}

/// Terminal front end: an append-only output log plus a separate alert channel.
pub struct Console<R, W, E> {
    input: R,
    output: W,
    alerts: E,
    // Clears the log before listings and waits for Enter after alerts.
    interactive: bool,
}

impl<R: BufRead, W: Write, E: Write> Console<R, W, E> {
    pub fn new(input: R, output: W, alerts: E, interactive: bool) -> Self {
        Self {
            input,
            output,
            alerts,
            interactive,
        }
    }

    /// Runs one action. Returns false when it was rejected or failed.
    pub async fn perform<S: DailyBarSource>(
        &mut self,
        controller: &Controller<S>,
        action: Action,
    ) -> io::Result<bool> {
        let result = match action {
            Action::Add { symbol } => controller.add(&symbol).await,
            Action::View => controller.view(),
            Action::Update {
                symbol,
                date,
                price,
            } => controller.update(&symbol, &date, &price),
            Action::Delete { symbol, date } => controller.delete(&symbol, &date),
            Action::Exit => return Ok(true),
        };

        match result {
            Ok(report) => {
                self.show(&report)?;
                Ok(true)
            }
            Err(ActionError::Validation(err)) => {
                self.alert(&err.to_string())?;
                Ok(false)
            }
            Err(err) => {
                log::error!("Action failed: {}", err);
                writeln!(self.alerts, "❌ {}", err)?;
                Ok(false)
            }
        }
    }

    /// Appends the lines of a report to the output log.
    pub fn show(&mut self, report: &Report) -> io::Result<()> {
        log::debug!(
            "{:?} report, {} rows affected",
            report.status(),
            report.rows_affected()
        );
        if self.interactive && matches!(report, Report::Listing(_)) {
            execute!(self.output, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        }
        for line in render(report) {
            writeln!(self.output, "{}", line)?;
        }
        self.output.flush()
    }

    /// Shows a blocking error message outside the output log.
    pub fn alert(&mut self, message: &str) -> io::Result<()> {
        let border = "=".repeat(message.chars().count() + 11);
        queue!(
            self.alerts,
            SetForegroundColor(Color::Red),
            SetAttribute(Attribute::Bold),
            Print(format!("{}\n [Error]  {}\n{}\n", border, message, border)),
            SetAttribute(Attribute::Reset),
            ResetColor,
        )?;
        if self.interactive {
            execute!(
                self.alerts,
                SetForegroundColor(Color::Yellow),
                Print("Press Enter to continue..."),
                ResetColor,
            )?;
            let mut ack = String::new();
            self.input.read_line(&mut ack)?;
        }
        self.alerts.flush()
    }

    // Prints a prompt and reads one line. None on end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    // Reads the fields of the next action. None on end of input.
    fn next_action(&mut self) -> io::Result<Option<Action>> {
        loop {
            write!(self.output, "{}", MENU)?;
            let Some(choice) = self.prompt("Choose an action: ")? else {
                return Ok(None);
            };
            let Some(choice) = parse_choice(&choice) else {
                writeln!(self.output, "Unknown action '{}'", choice.trim())?;
                continue;
            };

            let action = match choice {
                Choice::Add => {
                    let Some(symbol) = self.prompt("Stock Symbol (e.g., AAPL, 2330.TW): ")? else {
                        return Ok(None);
                    };
                    Action::Add { symbol }
                }
                Choice::View => Action::View,
                Choice::Update => {
                    let Some(symbol) = self.prompt("Stock Symbol: ")? else {
                        return Ok(None);
                    };
                    let Some(date) = self.prompt("Date (YYYY-MM-DD): ")? else {
                        return Ok(None);
                    };
                    let Some(price) = self.prompt("New Close Price (for update): ")? else {
                        return Ok(None);
                    };
                    Action::Update {
                        symbol,
                        date,
                        price,
                    }
                }
                Choice::Delete => {
                    let Some(symbol) = self.prompt("Stock Symbol: ")? else {
                        return Ok(None);
                    };
                    let Some(date) = self.prompt("Date (YYYY-MM-DD): ")? else {
                        return Ok(None);
                    };
                    Action::Delete { symbol, date }
                }
                Choice::Exit => Action::Exit,
            };
            return Ok(Some(action));
        }
    }

    /// Interactive loop. Ends on the exit action or end of input.
    pub async fn run<S: DailyBarSource>(&mut self, controller: &Controller<S>) -> io::Result<()> {
        writeln!(self.output, "Stock Management System")?;
        while let Some(action) = self.next_action()? {
            if action == Action::Exit {
                break;
            }
            self.perform(controller, action).await?;
        }
        writeln!(self.output, "Bye!")?;
        self.output.flush()
    }
}
