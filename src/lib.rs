//! Year-over-year import growth analysis over the Census international-trade API.
//!
//! Monthly slices are fetched per (year, month), aggregated into yearly
//! category totals, joined against the prior year and classified into
//! standard opportunities and low-volume "gems".

pub mod analyzer;
pub mod config;
pub mod fetcher;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod utils;
