//! Export core modules shared by the CLI and the result sink.

pub mod table;
pub mod tsv;

#[cfg(feature = "excel")]
pub mod excel_core;

pub use table::render_table;
pub use tsv::export_as_delimited_text;
