pub mod quote;
pub mod table;
pub mod target;

pub use quote::{Amount, Price, Quote, UnavailableReason};
pub use table::{DuplicateQuote, ResultTable};
pub use target::{matrix_targets, Target, TargetId};
