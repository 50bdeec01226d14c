//! NZB manifest projection
//!
//! Parses an uploaded NZB and reduces every file to what the listing page
//! needs: a display name, a total size and the ordered message-id list that
//! `/msgids` streams back.

use crate::error::{Error, Result};

/// One file of an uploaded manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestFile {
    /// Name taken from the NZB subject
    pub name: String,
    /// Sum of the segment byte counts
    pub size_bytes: u64,
    /// PAR2 recovery volume
    pub is_par2: bool,
    /// Message identifiers in segment-number order, without angle brackets
    pub message_ids: Vec<String>,
}

impl ManifestFile {
    /// Value for the hidden `msgids` form field: one identifier per line.
    pub fn msgids_field(&self) -> String {
        let mut field = String::new();
        for id in &self.message_ids {
            field.push_str(id);
            field.push('\n');
        }
        field
    }
}

/// A parsed manifest.
///
/// Regular files come first and PAR2 volumes last, each group in NZB order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    /// `<meta type="title">`, if present
    pub title: Option<String>,
    /// Files to list
    pub files: Vec<ManifestFile>,
}

impl Manifest {
    /// Parse raw NZB bytes.
    ///
    /// Invalid UTF-8, malformed XML or an NZB that fails validation is a
    /// [`Error::BadRequest`].
    pub fn parse(content: &[u8]) -> Result<Self> {
        let nzb_string = std::str::from_utf8(content)
            .map_err(|e| Error::BadRequest(format!("NZB content is not valid UTF-8: {}", e)))?;

        let nzb = nntp_rs::parse_nzb(nzb_string)
            .map_err(|e| Error::BadRequest(format!("Failed to parse NZB: {}", e)))?;

        nzb.validate()
            .map_err(|e| Error::BadRequest(format!("NZB validation failed: {}", e)))?;

        let title = nzb.meta.get("title").map(|s| s.to_string());

        let (mut files, par2): (Vec<ManifestFile>, Vec<ManifestFile>) = nzb
            .files
            .iter()
            .map(|file| {
                let mut segments: Vec<_> = file.segments.iter().collect();
                segments.sort_by_key(|segment| segment.number);

                let name = parse_filename_from_subject(&file.subject);
                ManifestFile {
                    is_par2: is_par2_name(&name),
                    size_bytes: segments.iter().map(|segment| segment.bytes as u64).sum(),
                    message_ids: segments
                        .iter()
                        .map(|segment| segment.message_id.clone())
                        .collect(),
                    name,
                }
            })
            .partition(|file| !file.is_par2);
        files.extend(par2);

        tracing::debug!(
            title = title.as_deref().unwrap_or(""),
            files = files.len(),
            "Parsed NZB manifest"
        );

        Ok(Self { title, files })
    }
}

/// Extract a filename from an NZB subject line.
///
/// NZB subjects typically contain the filename in quotes:
/// `"[01/10] - "filename.rar" yEnc (1/100)"`
/// Falls back to a hash-derived name when no quoted string is present.
fn parse_filename_from_subject(subject: &str) -> String {
    if let Some(start) = subject.find('"')
        && let Some(end) = subject[start + 1..].find('"')
    {
        let filename = &subject[start + 1..start + 1 + end];
        if !filename.is_empty() {
            return filename.to_string();
        }
    }
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    subject.hash(&mut hasher);
    format!("file_{:x}", hasher.finish())
}

fn is_par2_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".par2")
}
