// Presentation boundary: console output and the flat CSV export.

pub mod console;
pub mod export;

pub use console::{outcome_message, render_report};
pub use export::{ExportRow, export_to_path, read_export, write_export};
