//! Export of simulation fields to image files.

mod png;

pub use png::{export_field_png, PngExportError, PngExportOptions};
