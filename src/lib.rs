pub mod amount;
pub mod csv;
pub mod engine;
pub mod model;
pub mod session;
pub mod store;
pub mod validate;

pub use amount::Amount;
pub use engine::{Engine, LedgerError, LedgerReport, compute};
pub use model::{Acknowledgements, Expense, ExpenseId, PaidBy, Trip, TripSnapshot};
pub use session::{Command, TripSession};
pub use store::{MemoryStore, TripStore};
