pub mod diet;
pub mod phase;

pub use diet::{DietAction, DietActionOutcome, DietStartRow};
pub use phase::Phase;
