//! Expense ledger: the on-disk table and the summaries computed from it.

pub mod aggregate;
pub mod store;
pub mod types;

pub use aggregate::{daily_total, monthly_view, DailyTotal, LineItem, MonthSummary, MonthlyView};
pub use store::LedgerStore;
pub use types::{format_money, Entry, YearMonth};
