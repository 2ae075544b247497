pub mod census_parser;

pub use census_parser::{CensusParser, ColumnNames, Parser, RawTable};
