use crate::Amount;
use crate::amount::div_round_half_up;

/// Exact money in units of `1 / (Amount::SCALE * n)`, `n` being the participant count.
///
/// An equal share `amount / n` is exactly `amount.scaled()` parts, so splitting
/// never loses precision. Values only become [`Amount`]s when rounded to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) struct Parts(i128);

impl Parts {
    /// One participant's equal share of `amount`.
    pub fn share(amount: Amount) -> Self {
        Parts(amount.scaled() as i128)
    }

    /// The whole of `amount`.
    pub fn whole(amount: Amount, n: usize) -> Self {
        Parts(amount.scaled() as i128 * n as i128)
    }

    pub fn round_to_cent(self, n: usize) -> Amount {
        let cent = Parts::whole(Amount::CENT, n).0;
        let cents = div_round_half_up(self.0, cent);
        Amount::from_scaled(cents as i64 * Amount::CENT.scaled())
    }

    pub fn exceeds(self, threshold: Amount, n: usize) -> bool {
        self > Parts::whole(threshold, n)
    }
}

impl std::ops::Add for Parts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Parts(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Parts {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Parts(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Parts {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// A participant's running position during the fund walk.
#[derive(Debug, Default)]
pub(crate) struct ParticipantAccount {
    /// Initial contribution to the pool.
    pub contribution: Amount,
    /// Cash fronted personally: direct payments and covered shortfalls.
    pub extra_paid: Amount,
    /// Sum of every per-person charge.
    pub expense_share: Parts,
}

impl ParticipantAccount {
    pub fn new(contribution: Amount) -> Self {
        Self {
            contribution,
            ..Self::default()
        }
    }

    pub fn credit(&mut self, amount: Amount) {
        self.extra_paid += amount;
    }

    pub fn charge(&mut self, share: Parts) {
        self.expense_share += share;
    }

    pub fn balance(&self, n: usize) -> Parts {
        Parts::whole(self.contribution + self.extra_paid, n) - self.expense_share
    }
}
