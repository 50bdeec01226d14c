//! Route handlers
//!
//! - [`pages`]: landing page and NZB upload listing
//! - [`download`]: streaming a file from its message identifiers

use serde::Deserialize;

mod download;
mod pages;

pub use download::*;
pub use pages::*;

/// Form body for POST /msgids
#[derive(Debug, Deserialize)]
pub struct MsgIdsForm {
    /// Newline-separated message identifiers, in segment order
    pub msgids: String,
}
