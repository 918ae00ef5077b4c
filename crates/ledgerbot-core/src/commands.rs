//! Chat commands over the ledger: parse arguments, run the operation, render
//! the reply as Telegram HTML.

use std::{str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    clock::Clock,
    errors::Error,
    formatting::{bold, escape_html},
    ledger::{
        daily_total, format_money, monthly_view, Entry, LedgerStore, MonthlyView, YearMonth,
    },
    Result,
};

const ADD_USAGE: &str = "Usage: /add <amount> <description>";
const INVALID_AMOUNT: &str = "Invalid amount. Example: /add 25 lunch";
/// Largest amount a single `/add` accepts.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Split `/cmd@botname rest of text` into (`cmd`, `rest of text`).
///
/// The command is lowercased; the rest is trimmed.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Parse `<amount> <description...>` for `/add`.
///
/// The amount takes `,` or `.` as decimal separator and must be a plain,
/// non-negative number.
pub fn parse_add_args(args: &str) -> Result<(Decimal, String)> {
    let mut tokens = args.split_whitespace();
    let (Some(amount), Some(first_word)) = (tokens.next(), tokens.next()) else {
        return Err(Error::Input(ADD_USAGE.to_string()));
    };

    let amount = parse_amount(amount)?;
    let description = std::iter::once(first_word)
        .chain(tokens)
        .collect::<Vec<_>>()
        .join(" ");

    Ok((amount, description))
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    let normalized = raw.replace(',', ".");
    let invalid = || Error::Input(INVALID_AMOUNT.to_string());

    // `Decimal::from_str` also takes exponents and `_` separators.
    let unsigned = normalized
        .strip_prefix(['-', '+'])
        .unwrap_or(normalized.as_str());
    let plain = unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && unsigned.matches('.').count() <= 1;
    if !plain {
        return Err(invalid());
    }

    let amount = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::Input(
            "The amount cannot be negative. Example: /add 25 lunch".to_string(),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::Input(format!(
            "The amount is too large. The maximum is {MAX_AMOUNT}."
        )));
    }
    Ok(amount)
}

/// Command handlers bound to one ledger.
pub struct LedgerCommands {
    store: Arc<LedgerStore>,
    clock: Arc<dyn Clock>,
    currency: String,
}

impl LedgerCommands {
    pub fn new(store: Arc<LedgerStore>, clock: Arc<dyn Clock>, currency: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            currency: currency.into(),
        }
    }

    /// Run `command` with its raw argument text and return the HTML reply.
    ///
    /// `Error::Input` and `Error::StoreNotFound` carry a user-facing message
    /// (see [`Error::user_message`]); anything else is a real failure.
    pub fn execute(&self, command: &str, args: &str) -> Result<String> {
        match command {
            "start" | "help" => Ok(help_text()),
            "add" => self.add(args),
            "total" => self.total(),
            "month" | "mes" => self.month(),
            "reset" => self.reset(),
            other => Ok(format!(
                "Unknown command: /{}\nSend /start to see what I can do.",
                escape_html(other)
            )),
        }
    }

    fn money(&self, amount: Decimal) -> String {
        escape_html(&format_money(&self.currency, amount))
    }

    fn add(&self, args: &str) -> Result<String> {
        let (amount, description) = parse_add_args(args)?;
        let entry = Entry::new(self.clock.today(), amount, description);
        self.store.append(&entry)?;

        info!(amount = %entry.amount, "expense recorded");
        Ok(format!(
            "✅ Expense added: {} - {}",
            self.money(entry.amount),
            escape_html(&entry.description)
        ))
    }

    fn total(&self) -> Result<String> {
        let entries = self.store.scan()?;
        let today = daily_total(&entries, self.clock.today())?;
        Ok(format!("📅 Total today: {}", self.money(today.total)))
    }

    fn month(&self) -> Result<String> {
        let entries = self.store.scan()?;
        let year_month = YearMonth::of(self.clock.today());

        let summary = match monthly_view(&entries, year_month)? {
            MonthlyView::Empty => return Ok("📭 No expenses this month yet.".to_string()),
            MonthlyView::Items(summary) => summary,
        };

        let lines = summary
            .items
            .iter()
            .map(|item| {
                format!(
                    "• {} - {} - {}",
                    item.day_month,
                    escape_html(&item.description),
                    self.money(item.amount)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!(
            "🗓️ {}\n\n{lines}\n\n💰 {} {}",
            bold(&format!("Expenses for {}", summary.year_month)),
            bold("Month total:"),
            self.money(summary.total)
        ))
    }

    fn reset(&self) -> Result<String> {
        self.store.reset()?;
        Ok("🧹 History cleared!".to_string())
    }
}

fn help_text() -> String {
    "💬 <b>Expense Tracker</b>\n\n\
Commands:\n\
• /add &lt;amount&gt; &lt;description&gt; - record an expense\n\
• /total - today's total\n\
• /month - this month's expenses and total\n\
• /reset - erase the whole history"
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn commands_at(dir: &tempfile::TempDir, today: NaiveDate) -> (LedgerCommands, Arc<LedgerStore>) {
        let store = Arc::new(LedgerStore::new(dir.path().join("expenses.csv")));
        store.ensure_initialized().unwrap();
        let cmds = LedgerCommands::new(store.clone(), Arc::new(FixedClock(today)), "R$");
        (cmds, store)
    }

    #[test]
    fn parses_commands_with_bot_suffix() {
        assert_eq!(
            parse_command("/add@my_bot 12,50  lunch out"),
            ("add".to_string(), "12,50  lunch out".to_string())
        );
        assert_eq!(parse_command("/TOTAL"), ("total".to_string(), String::new()));
    }

    #[test]
    fn parses_add_args() {
        let (amount, desc) = parse_add_args("12,50 lunch   with  team").unwrap();
        assert_eq!(amount, Decimal::new(1250, 2));
        assert_eq!(desc, "lunch with team");

        let (amount, _) = parse_add_args("7.5 bus").unwrap();
        assert_eq!(amount, Decimal::new(75, 1));
    }

    #[test]
    fn rejects_bad_add_args() {
        for args in [
            "",
            "25",
            "abc lunch",
            "1e3 lunch",
            "1E-2 lunch",
            "1_000 lunch",
            "NaN x",
            "-5 refund",
            "1.234,56 tv",
            ". x",
            "+ x",
            "1000000001 yacht",
        ] {
            let err = parse_add_args(args).unwrap_err();
            assert!(matches!(err, Error::Input(_)), "{args:?} gave {err:?}");
        }
    }

    #[test]
    fn accepts_plain_amounts_up_to_the_maximum() {
        assert_eq!(parse_add_args("0 freebie").unwrap().0, Decimal::ZERO);
        assert_eq!(parse_add_args("1000000000 house").unwrap().0, MAX_AMOUNT);
    }

    #[test]
    fn malformed_amount_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 1));

        let err = cmds.execute("add", "abc lunch").unwrap_err();
        assert_eq!(err.user_message(), Some(INVALID_AMOUNT));
        assert!(store.scan().unwrap().is_empty());
    }

    #[test]
    fn add_records_entry_dated_today() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 1));

        let reply = cmds.execute("add", "25 almoço <b>").unwrap();
        assert_eq!(reply, "✅ Expense added: R$25.00 - almoço &lt;b&gt;");
        assert_eq!(
            store.scan().unwrap(),
            vec![Entry::new(date(2024, 1, 1), Decimal::new(25, 0), "almoço <b>")]
        );
    }

    #[test]
    fn total_reports_only_today() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 1));
        store
            .append(&Entry::new(date(2024, 1, 1), Decimal::new(1000, 2), "a"))
            .unwrap();
        store
            .append(&Entry::new(date(2024, 1, 2), Decimal::new(500, 2), "b"))
            .unwrap();

        assert_eq!(cmds.execute("total", "").unwrap(), "📅 Total today: R$10.00");
    }

    #[test]
    fn total_without_entries_today_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, _) = commands_at(&dir, date(2024, 1, 1));
        assert_eq!(cmds.execute("total", "").unwrap(), "📅 Total today: R$0.00");
    }

    #[test]
    fn month_lists_items_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 20));
        store
            .append(&Entry::new(date(2024, 1, 1), Decimal::new(1000, 2), "a"))
            .unwrap();
        store
            .append(&Entry::new(date(2023, 12, 31), Decimal::new(99, 0), "old"))
            .unwrap();
        store
            .append(&Entry::new(date(2024, 1, 2), Decimal::new(500, 2), ""))
            .unwrap();

        let reply = cmds.execute("mes", "").unwrap();
        assert_eq!(
            reply,
            "🗓️ <b>Expenses for 2024-01</b>\n\n\
• 01/01 - a - R$10.00\n\
• 02/01 - (no description) - R$5.00\n\n\
💰 <b>Month total:</b> R$15.00"
        );
    }

    #[test]
    fn month_without_entries_is_distinct_from_missing_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 2, 1));
        store
            .append(&Entry::new(date(2024, 1, 1), Decimal::new(1000, 2), "a"))
            .unwrap();
        assert_eq!(
            cmds.execute("month", "").unwrap(),
            "📭 No expenses this month yet."
        );

        let empty_dir = tempfile::tempdir().unwrap();
        let missing = LedgerCommands::new(
            Arc::new(LedgerStore::new(empty_dir.path().join("none.csv"))),
            Arc::new(FixedClock(date(2024, 2, 1))),
            "R$",
        );
        let err = missing.execute("month", "").unwrap_err();
        assert!(matches!(err, Error::StoreNotFound(_)));
        assert_eq!(err.user_message(), Some("No expenses recorded yet."));
        assert!(matches!(
            missing.execute("total", ""),
            Err(Error::StoreNotFound(_))
        ));
    }

    #[test]
    fn reset_clears_history() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 1));
        cmds.execute("add", "10 a").unwrap();

        assert_eq!(cmds.execute("reset", "").unwrap(), "🧹 History cleared!");
        assert!(store.scan().unwrap().is_empty());
        assert_eq!(cmds.execute("total", "").unwrap(), "📅 Total today: R$0.00");
    }

    #[test]
    fn corrupt_ledger_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 1));
        std::fs::write(store.path(), "date,amount,description\n2024-01-01,oops,x\n").unwrap();

        let err = cmds.execute("total", "").unwrap_err();
        assert!(matches!(err, Error::StoreCorrupt { .. }));
        assert!(err.user_message().is_none());
    }

    #[test]
    fn overflowing_totals_fail_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, store) = commands_at(&dir, date(2024, 1, 1));
        store
            .append(&Entry::new(date(2024, 1, 1), Decimal::MAX, "a"))
            .unwrap();
        cmds.execute("add", "1 b").unwrap();

        for command in ["total", "month"] {
            let err = cmds.execute(command, "").unwrap_err();
            assert!(matches!(err, Error::TotalOverflow), "{command}: {err:?}");
            assert!(err.user_message().is_none());
        }
        assert_eq!(cmds.execute("reset", "").unwrap(), "🧹 History cleared!");
        assert_eq!(cmds.execute("total", "").unwrap(), "📅 Total today: R$0.00");
    }

    #[test]
    fn help_and_unknown_commands() {
        let dir = tempfile::tempdir().unwrap();
        let (cmds, _) = commands_at(&dir, date(2024, 1, 1));
        assert!(cmds.execute("start", "").unwrap().contains("/add"));
        assert_eq!(cmds.execute("help", "").unwrap(), help_text());
        assert!(cmds
            .execute("frobnicate", "")
            .unwrap()
            .starts_with("Unknown command: /frobnicate"));
    }
}
