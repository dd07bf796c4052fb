//! Recording stand-ins for the external tools, used by the mirror's tests.

pub mod fake;
pub mod ledger;

pub use fake::FakeHost;
pub use ledger::{Call, CallLedger};
