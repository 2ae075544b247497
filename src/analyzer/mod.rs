// Analyzer module: the stages between raw monthly records and ranked opportunities.

pub mod aggregation;
pub mod comparison;
pub mod opportunity;
pub mod ranking;
pub mod scope;

// Re-export the stage entry points for ease of use.
pub use aggregation::aggregate;
pub use comparison::compare;
pub use opportunity::{OpportunityConfig, VolumeBand, classify, classify_row};
pub use ranking::rank;
pub use scope::{ChapterScope, scope};
