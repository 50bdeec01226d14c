//! HTML pages
//!
//! Page chrome comes from `header.html`, `index.html` and `footer.html` in the
//! templates directory. Missing files fall back to minimal built-in markup so
//! the service stays usable without a deployed template set.

use crate::manifest::{Manifest, ManifestFile};
use crate::utils::{escape_html, format_size_si};
use std::fmt::Write;
use std::path::Path;

const FALLBACK_HEADER: &str = "<!DOCTYPE html>\n<html>\n<head><title>usenet-stream</title></head>\n<body>\n";

const FALLBACK_INDEX: &str = "<form method=\"POST\" action=\"/nzb\" enctype=\"multipart/form-data\">\n\
    \t<input type=\"file\" name=\"nzb\" accept=\".nzb\"/>\n\
    \t<input type=\"submit\" value=\"Upload\"/>\n\
    </form>\n";

const FALLBACK_FOOTER: &str = "</body>\n</html>\n";

/// Template files making up the pages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    /// Opens every page
    Header,
    /// Upload form on the landing page
    Index,
    /// Closes every page
    Footer,
}

impl Template {
    fn file_name(self) -> &'static str {
        match self {
            Template::Header => "header.html",
            Template::Index => "index.html",
            Template::Footer => "footer.html",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Template::Header => FALLBACK_HEADER,
            Template::Index => FALLBACK_INDEX,
            Template::Footer => FALLBACK_FOOTER,
        }
    }

    /// Read the template from `dir`, or the built-in markup if that fails.
    pub async fn load(self, dir: &Path) -> String {
        let path = dir.join(self.file_name());
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Template unavailable, using built-in");
                self.fallback().to_string()
            }
        }
    }
}

/// Landing page: header, upload form, footer.
pub async fn render_index(templates_dir: &Path) -> String {
    let mut page = Template::Header.load(templates_dir).await;
    page.push_str(&Template::Index.load(templates_dir).await);
    page.push_str(&Template::Footer.load(templates_dir).await);
    page
}

/// Listing page for an uploaded manifest.
pub async fn render_listing(templates_dir: &Path, manifest: &Manifest) -> String {
    let mut page = Template::Header.load(templates_dir).await;
    for file in &manifest.files {
        push_file_entry(&mut page, file);
    }
    page.push_str(&Template::Footer.load(templates_dir).await);
    page
}

/// One `<p>` per file with a form posting its identifiers to `/msgids`.
fn push_file_entry(page: &mut String, file: &ManifestFile) {
    let label = if file.is_par2 { "ParFile" } else { "File" };
    // Writing to a String cannot fail
    let _ = write!(
        page,
        "<p>{}: {} ({})<br/>\r\n\
         \t<form method=\"POST\" action=\"/msgids\">\n\
         \t\t<input type=\"hidden\" name=\"msgids\" value=\"{}\"/>\n\
         \t\t<input type=\"submit\" value=\"Download\"/>\n\
         \t</form>\r\n\
         </p>\r\n\r\n",
        label,
        escape_html(&file.name),
        format_size_si(file.size_bytes),
        escape_html(&file.msgids_field()),
    );
}
