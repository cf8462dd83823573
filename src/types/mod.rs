pub mod date;
pub mod priority;

pub use date::{DateEncoding, parse_due_date};
pub use priority::Priority;
