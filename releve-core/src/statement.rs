//! Account statement types shared by every pipeline stage.
//!
//! The JSON layout is fixed:
//!
//! ```json
//! {
//!    "initial_amount": 1000.0,
//!    "final_amount": 1250.0,
//!    "transactions": [
//!       {"date": "2024-12-01", "label": "deposit", "amount": 300.0}
//!    ]
//! }
//! ```
//!
//! Amounts are read from their literal JSON text into exact decimals, so
//! `0.1 + 0.2` really is `0.3` here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::StatementError;

/// One ledger movement on a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Date as printed on the statement (not normalized)
    #[serde(default)]
    pub date: String,
    /// Description of the movement
    #[serde(default)]
    pub label: String,
    /// Positive = credit, negative = debit
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(date: impl Into<String>, label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date: date.into(),
            label: label.into(),
            amount,
        }
    }

    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

/// One statement period for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    pub initial_amount: Decimal,
    pub final_amount: Decimal,
    pub transactions: Vec<Transaction>,
}

impl AccountStatement {
    pub fn new(initial_amount: Decimal, final_amount: Decimal) -> Self {
        Self {
            initial_amount,
            final_amount,
            transactions: Vec::new(),
        }
    }

    pub fn with_transaction(mut self, txn: Transaction) -> Self {
        self.transactions.push(txn);
        self
    }

    /// Sum of every transaction amount.
    pub fn total_movement(&self) -> Result<Decimal, StatementError> {
        checked_sum(self.transactions.iter().map(|t| t.amount))
    }

    /// Sum of the positive amounts.
    pub fn total_credits(&self) -> Result<Decimal, StatementError> {
        checked_sum(
            self.transactions
                .iter()
                .filter(|t| t.is_credit())
                .map(|t| t.amount),
        )
    }

    /// Sum of the negative amounts (itself negative or zero).
    pub fn total_debits(&self) -> Result<Decimal, StatementError> {
        checked_sum(
            self.transactions
                .iter()
                .filter(|t| t.is_debit())
                .map(|t| t.amount),
        )
    }
}

/// Decimal addition panics past 96 bits; a document can carry such values.
pub(crate) fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, StatementError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or_else(StatementError::overflow)
    })
}

/// Parse a statement from JSON text.
///
/// Syntax errors map to [`StatementError::Parse`]; well-formed JSON with the
/// wrong shape maps to [`StatementError::Validation`].
pub fn parse_statement(json: &str) -> Result<AccountStatement, StatementError> {
    serde_json::from_str(json).map_err(StatementError::from_json)
}

/// Load a statement from a JSON file on disk.
pub fn load_statement(path: impl AsRef<Path>) -> Result<AccountStatement, StatementError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StatementError::InputNotFound(path.to_path_buf()),
        _ => StatementError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let statement = parse_statement(&raw)?;
    tracing::debug!(
        path = %path.display(),
        transactions = statement.transactions.len(),
        "loaded statement"
    );
    Ok(statement)
}

/// Serialize a statement the way the structuring stage writes it:
/// three-space indentation, non-ASCII labels kept verbatim.
pub fn to_pretty_json(statement: &AccountStatement) -> Result<String, StatementError> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    statement
        .serialize(&mut ser)
        .map_err(|e| StatementError::Validation(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| StatementError::Validation(e.to_string()))
}

/// Write a statement to `path`, creating the parent directory if needed.
pub fn write_statement(
    path: impl AsRef<Path>,
    statement: &AccountStatement,
) -> Result<(), StatementError> {
    let path = path.as_ref();
    let io_err = |source| StatementError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let json = to_pretty_json(statement)?;
    fs::write(path, json).map_err(io_err)?;
    Ok(())
}

/// Render an amount for reports: trailing zeros dropped, at least one
/// fractional digit kept, so equal values always print the same
/// (`1250.50` and `1250.5` both give `1250.5`, `1250` gives `1250.0`).
pub fn format_amount(amount: &Decimal) -> String {
    let amount = amount.normalize();
    if amount.scale() == 0 {
        format!("{amount}.0")
    } else {
        amount.to_string()
    }
}
