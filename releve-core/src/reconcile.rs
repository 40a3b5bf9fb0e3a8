//! Statement reconciliation: does `initial + Σ amounts` land on `final`?

use rust_decimal::Decimal;
use std::fmt;
use std::path::Path;

use crate::error::StatementError;
use crate::statement::{AccountStatement, format_amount, load_statement};

/// Result of comparing the recomputed balance with the stated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Balanced,
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// `initial_amount + Σ transaction.amount`
    pub calculated: Decimal,
    /// `final_amount` as stated on the document
    pub observed: Decimal,
    pub outcome: Outcome,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.outcome == Outcome::Balanced
    }

    /// Signed gap between the recomputed and stated balances, `None` when
    /// it does not fit in a `Decimal`.
    pub fn discrepancy(&self) -> Option<Decimal> {
        self.calculated.checked_sub(self.observed)
    }
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calculated = format_amount(&self.calculated);
        let observed = format_amount(&self.observed);
        match self.outcome {
            Outcome::Balanced => {
                writeln!(f, "Le montant final est correct.")?;
                write!(f, "calculé : {calculated} == observé : {observed}")
            }
            Outcome::Mismatch => write!(
                f,
                "Erreur: le montant calculé est {calculated}, mais le montant final est {observed}."
            ),
        }
    }
}

/// Recomputes final balances.
///
/// The default is exact decimal equality. A tolerance widens the accepted
/// band to `|calculated - final| <= tolerance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reconciler {
    tolerance: Decimal,
}

impl Reconciler {
    pub fn exact() -> Self {
        Self::default()
    }

    /// Accept `|calculated - final| <= tolerance`. Negative tolerances are rejected.
    pub fn with_tolerance(tolerance: Decimal) -> Result<Self, StatementError> {
        if tolerance.is_sign_negative() && !tolerance.is_zero() {
            return Err(StatementError::NegativeTolerance(tolerance));
        }
        Ok(Self {
            tolerance: tolerance.abs(),
        })
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Fails only when the recomputed balance overflows a `Decimal`.
    pub fn reconcile(&self, statement: &AccountStatement) -> Result<Reconciliation, StatementError> {
        let calculated = statement
            .initial_amount
            .checked_add(statement.total_movement()?)
            .ok_or_else(StatementError::overflow)?;
        let observed = statement.final_amount;

        // A gap too wide to represent is a mismatch, not an error.
        let outcome = match calculated.checked_sub(observed) {
            Some(gap) if gap.abs() <= self.tolerance => Outcome::Balanced,
            _ => Outcome::Mismatch,
        };

        tracing::debug!(
            %calculated,
            %observed,
            transactions = statement.transactions.len(),
            ?outcome,
            "reconciled statement"
        );

        Ok(Reconciliation {
            calculated,
            observed,
            outcome,
        })
    }

    /// Load a statement document and reconcile it.
    pub fn reconcile_file(&self, path: impl AsRef<Path>) -> Result<Reconciliation, StatementError> {
        let statement = load_statement(path)?;
        self.reconcile(&statement)
    }
}
