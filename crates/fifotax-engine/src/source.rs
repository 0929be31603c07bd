//! Collaborators that supply a user's history.

use fifotax_core::{DividendRecord, Money, NaiveDate, TransactionRecord};

use crate::error::SourceError;

/// Supplies one user's raw transaction history.
pub trait TransactionSource {
    /// All transaction rows for `user`, in any order.
    fn transactions(&self, user: &str) -> Result<Vec<TransactionRecord>, SourceError>;

    /// All dividend rows for `user`. Defaults to none.
    fn dividends(&self, user: &str) -> Result<Vec<DividendRecord>, SourceError> {
        let _ = user;
        Ok(Vec::new())
    }
}

/// One commission or fee charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionCharge {
    /// Date the charge was incurred; the exchange rate of this date applies.
    pub date: NaiveDate,
    /// Amount in its own currency.
    pub amount: Money,
    /// What the charge was for, used in warnings.
    pub label: String,
}

/// Supplies commissions charged outside the transaction rows.
///
/// Without one, the fees recorded on the transactions themselves are used.
pub trait CommissionSource {
    /// All commission charges for `user`.
    fn commissions(&self, user: &str) -> Result<Vec<CommissionCharge>, SourceError>;
}
