//! libsie - A parser for SIE bookkeeping exports
//! ---
//!
//! SIE is the line oriented format Swedish accounting programs use to move
//! a chart of accounts, opening and closing balances and dated journal
//! entries between each other. libsie turns such a file into a validated
//! [`Document`], and aggregates it into per account, per month balances that
//! income statements, balance sheets and VAT extracts are built from.
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Account identifiers and the chart of accounts.
pub mod account;

/// Fixed-point amounts counted in cents.
pub mod amount;

/// Per account running totals, bucketed by month.
pub mod balance;

/// Report tables and parse options, loadable from JSON.
pub mod config;

/// Typed decoding of a split line by its leading keyword, e.g. `#KONTO`.
pub mod directive;

/// Ledger representation.
pub mod ledger;

/// Our main parser entrypoints.
pub mod parser;

/// Numbers behind the income statement, balance sheet and VAT extract.
pub mod report;

/// Account range classification.
///
/// The [`SectionClassifier`][section::SectionClassifier] walks accounts in
/// identifier order and reports where each statutory section begins and
/// ends, together with its subtotal.
pub mod section;

/// Splits a raw line into fields.
pub mod tokenizer;

/// Vouchers, their transactions and annotations.
pub mod transaction;

pub use account::{Account, AccountId};
pub use amount::Decimal;
pub use balance::{Balance, YearMonth};
pub use config::{AccountOrder, ParseOptions, ReportConfig};
pub use ledger::Document;
pub use parser::{parse, parse_lines, parse_lines_with, DocumentParser};
pub use transaction::{Annotation, Entry, Transaction};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SieError {
    #[error("malformed date `{0}'")]
    MalformedDate(String),

    #[error("malformed amount `{0}'")]
    MalformedAmount(String),

    #[error("malformed annotation list `{0}'")]
    MalformedAnnotation(String),

    #[error("unknown account `{0}'")]
    UnknownAccount(String),

    #[error("entry `{0}' is never terminated")]
    UnterminatedEntry(String),

    #[error("`{directive}' is missing field {position}")]
    MissingField {
        directive: &'static str,
        position: usize,
    },

    #[error("`{directive}' has malformed field `{value}'")]
    MalformedField {
        directive: &'static str,
        value: String,
    },

    #[error("entry terminator without an open entry")]
    UnexpectedTerminator,

    #[error("transaction outside of an entry")]
    TransactionOutsideEntry,

    #[error("amount out of range")]
    Overflow,

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        source: Box<SieError>,
    },
}

impl SieError {
    /// Attaches the input line an error was found at. Errors that already
    /// carry a line keep it.
    pub fn at_line(self, line: usize) -> SieError {
        match self {
            SieError::AtLine { .. } => self,
            err => SieError::AtLine {
                line,
                source: Box::new(err),
            },
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            SieError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The error without its line information.
    pub fn root(&self) -> &SieError {
        match self {
            SieError::AtLine { source, .. } => source.root(),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, SieError>;

static INIT_TRACING: Once = Once::new();

/// Installs a fmt subscriber writing to stderr. The filter is read from
/// `RUST_LOG` and defaults to `libsie=info`. Calling it again is a no-op.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("libsie=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use crate::SieError;

    #[test]
    fn line_wraps_once() {
        let err = SieError::UnknownAccount("1930".to_string())
            .at_line(4)
            .at_line(9);
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.root(), &SieError::UnknownAccount("1930".to_string()));
        assert_eq!(err.to_string(), "line 4: unknown account `1930'");
    }

    #[test]
    fn field_errors_name_directive() {
        let err = SieError::MissingField {
            directive: "#VER",
            position: 3,
        };
        assert_eq!(err.to_string(), "`#VER' is missing field 3");
    }

    #[test]
    fn init_tracing_twice() {
        crate::init_tracing();
        crate::init_tracing();
    }
}
