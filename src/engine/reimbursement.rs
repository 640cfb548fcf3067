//! Person-to-person obligations created during the fund walk.

use super::report::{Reimbursement, SettlementStatus};
use super::state::Parts;
use crate::Amount;
use crate::model::Acknowledgements;

/// Debts owed to one payer, debtors in first-seen order.
#[derive(Debug)]
struct PayerEntry {
    payer: usize,
    debtors: Vec<(usize, Parts)>,
}

/// Accumulates reimbursements by participant index, keeping first-seen order.
#[derive(Debug, Default)]
pub(crate) struct ReimbursementLedger {
    payers: Vec<PayerEntry>,
}

impl ReimbursementLedger {
    /// `debtor` owes `payer` one more `share`.
    pub fn record(&mut self, payer: usize, debtor: usize, share: Parts) {
        let entry = match self.payers.iter().position(|e| e.payer == payer) {
            Some(idx) => &mut self.payers[idx],
            None => {
                self.payers.push(PayerEntry {
                    payer,
                    debtors: Vec::new(),
                });
                let last = self.payers.len() - 1;
                &mut self.payers[last]
            }
        };

        match entry.debtors.iter_mut().find(|(d, _)| *d == debtor) {
            Some((_, owed)) => *owed += share,
            None => entry.debtors.push((debtor, share)),
        }
    }

    /// Flatten into report rows, dropping anything at or below one cent.
    pub fn into_report(self, names: &[String], acks: &Acknowledgements) -> Vec<Reimbursement> {
        let n = names.len();
        self.payers
            .into_iter()
            .flat_map(|entry| {
                let payer = entry.payer;
                entry
                    .debtors
                    .into_iter()
                    .map(move |(debtor, owed)| (payer, debtor, owed))
            })
            .filter(|(_, _, owed)| owed.exceeds(Amount::CENT, n))
            .map(|(payer, debtor, owed)| {
                let payer = names[payer].clone();
                let debtor = names[debtor].clone();
                let status = SettlementStatus::from_received(acks.is_received(&payer, &debtor));
                Reimbursement {
                    amount: owed.round_to_cent(n),
                    payer,
                    debtor,
                    status,
                }
            })
            .collect()
    }
}
