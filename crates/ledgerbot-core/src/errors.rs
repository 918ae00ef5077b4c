use std::path::PathBuf;

/// Core error type for the ledger bot.
///
/// Adapter crates map their specific errors into this type so the command
/// layer can tell user-facing failures apart from hard ones.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Malformed user-supplied arguments. Nothing was written.
    #[error("{0}")]
    Input(String),

    #[error("ledger not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    #[error("ledger corrupt at line {line}: {reason}")]
    StoreCorrupt { line: u64, reason: String },

    /// A sum over stored amounts does not fit in a `Decimal`.
    #[error("ledger total out of range")]
    TotalOverflow,

    #[error("ledger i/o error: {0}")]
    StoreIo(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Text that can be shown to the chat as-is, for errors that are part of
    /// normal operation. `None` means the failure should be logged.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Error::Input(msg) => Some(msg),
            Error::StoreNotFound(_) => Some("No expenses recorded yet."),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_and_missing_store_are_user_facing() {
        assert_eq!(
            Error::Input("Invalid amount.".into()).user_message(),
            Some("Invalid amount.")
        );
        assert!(Error::StoreNotFound(PathBuf::from("x.csv"))
            .user_message()
            .is_some());
        let corrupt = Error::StoreCorrupt {
            line: 3,
            reason: "bad amount".into(),
        };
        assert!(corrupt.user_message().is_none());
        assert_eq!(corrupt.to_string(), "ledger corrupt at line 3: bad amount");
    }
}
