//! Ledger performance metrics.
//!
//! Computed from the trade list alone; no price data is involved.

use super::trade::{CloseReason, Direction, Trade, TradeKind};

/// Balance the drawdown simulation starts from.
pub const DEFAULT_STARTING_BALANCE: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub starting_balance: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub long_opens: usize,
    pub short_opens: usize,
    pub closed_trades: usize,
    pub take_profit_closes: usize,
    pub stop_loss_closes: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Fraction of closed trades that won; 0 when nothing closed.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Total profit over total loss, or total profit when nothing lost.
    pub profit_factor: f64,
    /// Largest peak-to-trough fall as a fraction of the peak.
    pub max_drawdown: f64,
    pub max_drawdown_amount: f64,
    pub starting_balance: f64,
    pub final_balance: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade], config: &MetricsConfig) -> Self {
        let mut long_opens = 0usize;
        let mut short_opens = 0usize;
        let mut take_profit_closes = 0usize;
        let mut stop_loss_closes = 0usize;
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_profit = 0.0_f64;
        let mut total_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            match trade.kind() {
                TradeKind::Open(Direction::Long) => long_opens += 1,
                TradeKind::Open(Direction::Short) => short_opens += 1,
                TradeKind::Close(reason) => {
                    match reason {
                        CloseReason::TakeProfit => take_profit_closes += 1,
                        CloseReason::StopLoss => stop_loss_closes += 1,
                    }

                    let pnl = trade.realized_pnl();
                    if pnl > 0.0 {
                        trades_won += 1;
                        total_profit += pnl;
                        if pnl > largest_win {
                            largest_win = pnl;
                        }
                    } else if pnl < 0.0 {
                        trades_lost += 1;
                        total_loss += pnl.abs();
                        if pnl.abs() > largest_loss {
                            largest_loss = pnl.abs();
                        }
                    } else {
                        trades_breakeven += 1;
                    }
                }
            }
        }

        let closed_trades = take_profit_closes + stop_loss_closes;
        let win_rate = trades_won as f64 / closed_trades.max(1) as f64;

        let profit_factor = if total_loss == 0.0 {
            total_profit
        } else {
            total_profit / total_loss
        };

        let avg_win = if trades_won > 0 {
            total_profit / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_loss / trades_lost as f64
        } else {
            0.0
        };

        let drawdown = compute_drawdown(trades, config.starting_balance);

        Metrics {
            total_trades: trades.len(),
            long_opens,
            short_opens,
            closed_trades,
            take_profit_closes,
            stop_loss_closes,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            total_pnl: total_profit - total_loss,
            total_profit,
            total_loss,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            profit_factor,
            max_drawdown: drawdown.max_pct,
            max_drawdown_amount: drawdown.max_amount,
            starting_balance: config.starting_balance,
            final_balance: drawdown.final_balance,
        }
    }
}

struct Drawdown {
    max_pct: f64,
    max_amount: f64,
    final_balance: f64,
}

/// Balance state after one trade.
struct DrawdownStep {
    balance: f64,
    peak: f64,
    /// Running maximum of `(peak - balance) / peak`.
    max_pct: f64,
}

fn drawdown_steps(
    trades: &[Trade],
    starting_balance: f64,
) -> impl Iterator<Item = DrawdownStep> + '_ {
    let mut balance = starting_balance;
    let mut peak = starting_balance;
    let mut max_pct = 0.0_f64;

    trades.iter().map(move |trade| {
        balance += trade.realized_pnl();
        peak = peak.max(balance);
        if peak > 0.0 {
            max_pct = max_pct.max((peak - balance) / peak);
        }
        DrawdownStep {
            balance,
            peak,
            max_pct,
        }
    })
}

fn compute_drawdown(trades: &[Trade], starting_balance: f64) -> Drawdown {
    drawdown_steps(trades, starting_balance).fold(
        Drawdown {
            max_pct: 0.0,
            max_amount: 0.0,
            final_balance: starting_balance,
        },
        |acc, step| Drawdown {
            max_pct: step.max_pct,
            max_amount: acc.max_amount.max(step.peak - step.balance),
            final_balance: step.balance,
        },
    )
}

/// Running maximum drawdown after each trade, as a fraction of the peak.
pub fn drawdown_series(trades: &[Trade], starting_balance: f64) -> Vec<f64> {
    drawdown_steps(trades, starting_balance)
        .map(|step| step.max_pct)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(i)
    }

    fn make_ledger(rows: &[(&str, f64)]) -> Vec<Trade> {
        rows.iter()
            .enumerate()
            .map(|(i, &(label, pnl))| Trade::from_label(at(i as i64), label, 1.0, 1.1, pnl).unwrap())
            .collect()
    }

    fn compute(rows: &[(&str, f64)]) -> Metrics {
        Metrics::compute(&make_ledger(rows), &MetricsConfig::default())
    }

    #[test]
    fn metrics_empty_ledger() {
        let m = compute(&[]);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.closed_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.final_balance, DEFAULT_STARTING_BALANCE);
    }

    #[test]
    fn win_rate_zero_without_closes() {
        let m = compute(&[("buy", 0.0), ("sell", 0.0)]);
        assert_eq!(m.closed_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert!(!m.win_rate.is_nan());
        assert_eq!(m.long_opens, 1);
        assert_eq!(m.short_opens, 1);
    }

    #[test]
    fn counts_and_win_rate() {
        let m = compute(&[
            ("buy", 0.0),
            ("t/p", 100.0),
            ("sell", 0.0),
            ("s/l", -50.0),
            ("buy", 0.0),
            ("close at stop", 0.0),
            ("buy", 0.0),
            ("close", 200.0),
        ]);
        assert_eq!(m.total_trades, 8);
        assert_eq!(m.closed_trades, 4);
        assert_eq!(m.take_profit_closes, 2);
        assert_eq!(m.stop_loss_closes, 2);
        assert_eq!(m.trades_won, 2);
        assert_eq!(m.trades_lost, 1);
        assert_eq!(m.trades_breakeven, 1);
        assert_relative_eq!(m.win_rate, 0.5);
    }

    #[test]
    fn pnl_totals_and_averages() {
        let m = compute(&[
            ("t/p", 100.0),
            ("s/l", -60.0),
            ("t/p", 200.0),
            ("s/l", -40.0),
        ]);
        assert_relative_eq!(m.total_profit, 300.0);
        assert_relative_eq!(m.total_loss, 100.0);
        assert_relative_eq!(m.total_pnl, 200.0);
        assert_relative_eq!(m.avg_win, 150.0);
        assert_relative_eq!(m.avg_loss, 50.0);
        assert_relative_eq!(m.largest_win, 200.0);
        assert_relative_eq!(m.largest_loss, 60.0);
        assert_relative_eq!(m.profit_factor, 3.0);
        assert_relative_eq!(m.final_balance, 100_200.0);
    }

    #[test]
    fn profit_factor_without_losses_is_total_profit() {
        let m = compute(&[("t/p", 100.0), ("t/p", 25.0)]);
        assert_relative_eq!(m.profit_factor, 125.0);
    }

    #[test]
    fn max_drawdown_from_running_balance() {
        // balance: 100_000 -> 110_000 -> 90_000 -> 95_000 -> 80_000 -> 100_000
        let m = compute(&[
            ("t/p", 10_000.0),
            ("s/l", -20_000.0),
            ("t/p", 5_000.0),
            ("s/l", -15_000.0),
            ("t/p", 20_000.0),
        ]);
        assert_relative_eq!(m.max_drawdown, 30_000.0 / 110_000.0, epsilon = 1e-12);
        assert_relative_eq!(m.max_drawdown_amount, 30_000.0);
    }

    #[test]
    fn custom_starting_balance() {
        let trades = make_ledger(&[("s/l", -500.0)]);
        let m = Metrics::compute(
            &trades,
            &MetricsConfig {
                starting_balance: 1_000.0,
            },
        );
        assert_relative_eq!(m.max_drawdown, 0.5);
        assert_relative_eq!(m.final_balance, 500.0);
    }

    #[test]
    fn drawdown_ignores_non_positive_peak() {
        let trades = make_ledger(&[("s/l", -50.0), ("s/l", -10.0)]);
        let m = Metrics::compute(&trades, &MetricsConfig { starting_balance: 0.0 });
        assert_eq!(m.max_drawdown, 0.0);
        assert_relative_eq!(m.max_drawdown_amount, 60.0);
    }

    #[test]
    fn drawdown_series_is_running_max() {
        let trades = make_ledger(&[
            ("s/l", -10_000.0),
            ("t/p", 5_000.0),
            ("t/p", 10_000.0),
            ("s/l", -2_000.0),
        ]);
        let series = drawdown_series(&trades, DEFAULT_STARTING_BALANCE);
        assert_eq!(series.len(), 4);
        assert_relative_eq!(series[0], 0.1);
        assert_relative_eq!(series[1], 0.1);
        assert_relative_eq!(series[2], 0.1);
        assert_relative_eq!(series[3], 0.1);
    }

    #[test]
    fn drawdown_series_ends_at_metrics_drawdown() {
        let trades = make_ledger(&[
            ("buy", 0.0),
            ("t/p", 4_000.0),
            ("s/l", -9_000.0),
            ("t/p", 1_000.0),
            ("s/l", -3_000.0),
        ]);
        let m = Metrics::compute(&trades, &MetricsConfig::default());
        let series = drawdown_series(&trades, DEFAULT_STARTING_BALANCE);
        assert_eq!(series.last().copied(), Some(m.max_drawdown));
        // peak 104_000, trough 93_000
        assert_relative_eq!(m.max_drawdown, 11_000.0 / 104_000.0, epsilon = 1e-12);
        assert_relative_eq!(m.max_drawdown_amount, 11_000.0);
        assert_relative_eq!(m.final_balance, 93_000.0);
    }
}
