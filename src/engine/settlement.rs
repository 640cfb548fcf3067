//! Greedy settlement of rounded balances.

use super::report::{Settlement, SettlementStatus};
use crate::Amount;
use crate::model::Acknowledgements;

/// Derive transfers that clear the given rounded balances.
///
/// Creditors (above one cent) are taken largest first and debtors (below minus
/// one cent) most negative first. Ties keep the input order. Each creditor is
/// matched against each debtor in turn, moving `min(credit, |debt|)` while both
/// still exceed a cent. This does not always give the fewest transfers, but the
/// output is fully determined by the input order.
pub(crate) fn derive(balances: &[(&str, Amount)], acks: &Acknowledgements) -> Vec<Settlement> {
    let mut creditors: Vec<(&str, Amount)> = balances
        .iter()
        .copied()
        .filter(|(_, balance)| *balance > Amount::CENT)
        .collect();
    creditors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut debtors: Vec<(&str, Amount)> = balances
        .iter()
        .copied()
        .filter(|(_, balance)| *balance < -Amount::CENT)
        .collect();
    debtors.sort_by(|a, b| a.1.cmp(&b.1));

    let mut settlements = Vec::new();
    for (creditor, credit) in creditors.iter_mut() {
        for (debtor, debt) in debtors.iter_mut() {
            if *credit > Amount::CENT && debt.abs() > Amount::CENT {
                let amount = (*credit).min(debt.abs());
                settlements.push(Settlement {
                    from: debtor.to_string(),
                    to: creditor.to_string(),
                    amount,
                    status: SettlementStatus::from_received(acks.is_received(creditor, debtor)),
                });
                *credit -= amount;
                *debt += amount;
            }
        }
    }
    settlements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(value: f64) -> Amount {
        Amount::from_float(value)
    }

    fn triples(settlements: &[Settlement]) -> Vec<(&str, &str, Amount)> {
        settlements
            .iter()
            .map(|s| (s.from.as_str(), s.to.as_str(), s.amount))
            .collect()
    }

    #[test]
    fn no_settlements_when_balanced() {
        let balances = [("A", amt(0.0)), ("B", amt(0.01)), ("C", amt(-0.01))];
        assert!(derive(&balances, &Acknowledgements::new()).is_empty());
    }

    #[test]
    fn single_debtor_pays_single_creditor() {
        let balances = [("A", amt(15.0)), ("B", amt(-15.0))];
        let settlements = derive(&balances, &Acknowledgements::new());
        assert_eq!(triples(&settlements), vec![("B", "A", amt(15.0))]);
        assert_eq!(settlements[0].status, SettlementStatus::Pending);
    }

    #[test]
    fn largest_creditor_is_served_first() {
        let balances = [
            ("A", amt(-50.0)),
            ("B", amt(20.0)),
            ("C", amt(40.0)),
            ("D", amt(-10.0)),
        ];
        let settlements = derive(&balances, &Acknowledgements::new());
        assert_eq!(
            triples(&settlements),
            vec![
                ("A", "C", amt(40.0)),
                ("A", "B", amt(10.0)),
                ("D", "B", amt(10.0)),
            ]
        );
    }

    #[test]
    fn equal_debts_keep_participant_order() {
        let balances = [("A", amt(-30.0)), ("B", amt(60.0)), ("C", amt(-30.0))];
        let settlements = derive(&balances, &Acknowledgements::new());
        assert_eq!(
            triples(&settlements),
            vec![("A", "B", amt(30.0)), ("C", "B", amt(30.0))]
        );
    }

    #[test]
    fn applying_settlements_clears_balances() {
        let balances = [
            ("A", amt(-12.34)),
            ("B", amt(45.67)),
            ("C", amt(-33.33)),
            ("D", amt(0.0)),
        ];
        let settlements = derive(&balances, &Acknowledgements::new());

        let mut remaining: Vec<(&str, Amount)> = balances.to_vec();
        for s in &settlements {
            for (name, balance) in remaining.iter_mut() {
                if *name == s.from {
                    *balance += s.amount;
                } else if *name == s.to {
                    *balance -= s.amount;
                }
            }
        }
        assert!(remaining.iter().all(|(_, b)| b.abs() <= Amount::CENT));
    }

    #[test]
    fn status_follows_acknowledgement_of_creditor() {
        let mut acks = Acknowledgements::new();
        acks.mark_received("A", "B");
        let balances = [("A", amt(15.0)), ("B", amt(-15.0))];
        let settlements = derive(&balances, &acks);
        assert_eq!(settlements[0].status, SettlementStatus::Received);
    }
}
