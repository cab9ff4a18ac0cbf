//! Library half of the `novena-eeprom` tool: text forms of the record fields
//! and the read/edit/write flow, so both can be tested without hardware.

pub mod edit;
pub mod error;
pub mod mac;
pub mod modeline;
pub mod report;
pub mod session;

pub use edit::Edits;
pub use error::Error;
pub use report::Report;
pub use session::{Invocation, run};
