//! Computed ledger, as handed to the presentation layer.

use std::fmt;

use serde::Serialize;

use crate::Amount;
use crate::model::ExpenseId;

/// Whether a reimbursement or settlement has been acknowledged as paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Received,
}

impl SettlementStatus {
    pub(crate) fn from_received(received: bool) -> Self {
        if received {
            SettlementStatus::Received
        } else {
            SettlementStatus::Pending
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementStatus::Pending => f.write_str("pending"),
            SettlementStatus::Received => f.write_str("received"),
        }
    }
}

/// How a single expense was paid for.
///
/// `from_fund + fronted + unattributed` always equals the expense amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseOutcome {
    pub id: ExpenseId,
    /// Equal share of the whole expense, rounded to the cent.
    pub per_person_share: Amount,
    /// Portion drawn from the pooled fund.
    pub from_fund: Amount,
    /// Portion a participant paid out of pocket.
    pub fronted: Amount,
    /// Shortfall left with no designated payer.
    pub unattributed: Amount,
}

/// Per-participant breakdown, rounded to the cent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantBalance {
    pub name: String,
    pub contribution: Amount,
    pub extra_paid: Amount,
    pub expense_share: Amount,
    /// Net position: positive is owed money, negative owes money.
    pub balance: Amount,
}

/// `debtor` owes `payer` for cash the payer fronted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reimbursement {
    pub payer: String,
    pub debtor: String,
    pub amount: Amount,
    pub status: SettlementStatus,
}

/// Instruction: `from` pays `to` the given amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub status: SettlementStatus,
}

/// Everything derived from one trip snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerReport {
    pub total_pooled: Amount,
    pub total_expenses: Amount,
    pub deducted_from_fund: Amount,
    /// What is left in the pool after the walk; never negative.
    pub fund_remaining: Amount,
    /// In trip participant order.
    pub participants: Vec<ParticipantBalance>,
    /// In the order expenses were walked.
    pub expenses: Vec<ExpenseOutcome>,
    /// Grouped by payer, in the order obligations first arose.
    pub reimbursements: Vec<Reimbursement>,
    pub settlements: Vec<Settlement>,
}

impl LedgerReport {
    pub fn balance(&self, name: &str) -> Option<Amount> {
        self.participants
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.balance)
    }

    pub fn reimbursement(&self, payer: &str, debtor: &str) -> Option<&Reimbursement> {
        self.reimbursements
            .iter()
            .find(|r| r.payer == payer && r.debtor == debtor)
    }

    pub fn expense(&self, id: &str) -> Option<&ExpenseOutcome> {
        self.expenses.iter().find(|e| e.id == id)
    }
}
