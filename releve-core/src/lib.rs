//! releve-core: account statement model and balance reconciliation

pub mod error;
pub mod reconcile;
pub mod statement;

pub use error::StatementError;
pub use reconcile::{Outcome, Reconciler, Reconciliation};
pub use statement::{
    AccountStatement, Transaction, format_amount, load_statement, parse_statement,
    to_pretty_json, write_statement,
};
