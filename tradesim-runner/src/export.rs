//! CSV export of the closed-trade ledger for external analysis tools.
//!
//! Columns: id, symbol, side, strategy, opened_at, closed_at, entry_price,
//! exit_price, size_fraction, notional, stop_loss, take_profit, exit_reason,
//! pnl, pnl_fraction

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use tradesim_core::domain::ClosedTrade;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat CSV row for one closed trade.
#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    id: &'a str,
    symbol: &'a str,
    side: &'static str,
    strategy: &'a str,
    opened_at: Option<i64>,
    closed_at: Option<i64>,
    entry_price: f64,
    exit_price: f64,
    size_fraction: f64,
    notional: f64,
    stop_loss: f64,
    take_profit: f64,
    exit_reason: &'static str,
    pnl: f64,
    pnl_fraction: f64,
}

impl<'a> From<&'a ClosedTrade> for TradeRow<'a> {
    fn from(t: &'a ClosedTrade) -> Self {
        let p = &t.position;
        Self {
            id: &p.id.0,
            symbol: &p.symbol,
            side: p.side.as_str(),
            strategy: &p.strategy,
            opened_at: p.opened_at,
            closed_at: t.closed_at,
            entry_price: p.entry_price,
            exit_price: t.exit_price,
            size_fraction: p.size_fraction,
            notional: p.notional,
            stop_loss: p.stop_loss,
            take_profit: p.take_profit,
            exit_reason: t.exit_reason.as_str(),
            pnl: t.pnl,
            pnl_fraction: t.pnl_fraction,
        }
    }
}

/// Write `trades` to `path` as CSV with a header row.
pub fn export_trades_csv(path: &Path, trades: &[ClosedTrade]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for trade in trades {
        wtr.serialize(TradeRow::from(trade))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tradesim_core::domain::{ExitReason, Position, PositionId, PositionSide};

    fn trade(pnl: f64, reason: ExitReason) -> ClosedTrade {
        ClosedTrade {
            position: Position {
                id: PositionId("00aa11bb22".into()),
                symbol: "SOL".into(),
                side: PositionSide::Long,
                entry_price: 20.0,
                size_fraction: 0.25,
                notional: 250.0,
                stop_loss: 19.4,
                take_profit: 21.2,
                opened_at: Some(1000),
                strategy: "sma_cross".into(),
            },
            exit_price: 21.2,
            closed_at: None,
            exit_reason: reason,
            pnl,
            pnl_fraction: pnl / 250.0,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/trades.csv");
        export_trades_csv(&path, &[trade(15.0, ExitReason::TakeProfit), trade(-1.5, ExitReason::Final)])
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,symbol,side,strategy,opened_at,closed_at,entry_price"));
        assert!(lines[1].starts_with("00aa11bb22,SOL,long,sma_cross,1000,,20.0,21.2"));
        assert!(lines[1].contains(",take_profit,15.0,"));
        assert!(lines[2].contains(",final,-1.5,"));
    }

    #[test]
    fn empty_ledger_writes_nothing_but_succeeds() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("trades.csv");
        export_trades_csv(&path, &[]).unwrap();
        assert!(path.exists());
    }
}
