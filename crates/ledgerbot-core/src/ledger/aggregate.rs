//! Daily and monthly summaries over a ledger scan.
//!
//! Everything here is pure; "today" and the month are passed in.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    errors::Error,
    ledger::types::{Entry, YearMonth},
    Result,
};

pub const EMPTY_DESCRIPTION: &str = "(no description)";

/// Sum of one day's entries.
///
/// A day without entries yields `total == 0` and `count == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyTotal {
    pub total: Decimal,
    pub count: usize,
}

pub fn daily_total(entries: &[Entry], today: NaiveDate) -> Result<DailyTotal> {
    entries.iter().filter(|e| e.date == today).try_fold(
        DailyTotal {
            total: Decimal::ZERO,
            count: 0,
        },
        |acc, e| {
            Ok(DailyTotal {
                total: acc.total.checked_add(e.amount).ok_or(Error::TotalOverflow)?,
                count: acc.count + 1,
            })
        },
    )
}

fn checked_sum(mut amounts: impl Iterator<Item = Decimal>) -> Result<Decimal> {
    amounts.try_fold(Decimal::ZERO, |acc, a| {
        acc.checked_add(a).ok_or(Error::TotalOverflow)
    })
}

/// One row of a monthly listing, ready to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    /// `dd/mm`
    pub day_month: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthSummary {
    pub year_month: YearMonth,
    pub items: Vec<LineItem>,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonthlyView {
    /// The ledger has entries, just none in this month.
    Empty,
    Items(MonthSummary),
}

pub fn monthly_view(entries: &[Entry], year_month: YearMonth) -> Result<MonthlyView> {
    let items: Vec<LineItem> = entries
        .iter()
        .filter(|e| year_month.contains(e.date))
        .map(|e| LineItem {
            day_month: e.date.format("%d/%m").to_string(),
            description: if e.description.is_empty() {
                EMPTY_DESCRIPTION.to_string()
            } else {
                e.description.clone()
            },
            amount: e.amount,
        })
        .collect();

    if items.is_empty() {
        return Ok(MonthlyView::Empty);
    }

    let total = checked_sum(items.iter().map(|i| i.amount))?;
    Ok(MonthlyView::Items(MonthSummary {
        year_month,
        items,
        total,
    }))
}
