//! Output renderers.
//!
//! - [`csv`]: the pipe-delimited stats document that is uploaded
//! - [`json`]: JSON lines for reading an exported document back

pub mod csv;
pub mod json;
