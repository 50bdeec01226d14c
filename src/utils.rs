//! Utility functions for message-id handling and response rendering

/// Wrap a message identifier in angle brackets unless it already is.
///
/// NZB files store identifiers without brackets, while the NNTP `BODY`
/// command expects them.
///
/// # Examples
///
/// ```
/// use usenet_stream::utils::bracket_message_id;
///
/// assert_eq!(bracket_message_id("part1@news"), "<part1@news>");
/// assert_eq!(bracket_message_id("<part1@news>"), "<part1@news>");
/// ```
#[must_use]
pub fn bracket_message_id(id: &str) -> String {
    if id.starts_with('<') {
        id.to_string()
    } else {
        format!("<{}>", id)
    }
}

/// Format a byte count with decimal (SI) units.
///
/// # Examples
///
/// ```
/// use usenet_stream::utils::format_size_si;
///
/// assert_eq!(format_size_si(999), "999 B");
/// assert_eq!(format_size_si(1_500), "1.5 kB");
/// assert_eq!(format_size_si(2_000_000), "2.0 MB");
/// ```
#[must_use]
pub fn format_size_si(bytes: u64) -> String {
    const UNIT: u64 = 1000;
    const PREFIXES: &[char] = &['k', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make a poster-supplied file name safe for a `Content-Disposition` header.
///
/// Control characters and path separators are replaced with `_`; an empty
/// result becomes `"download"`.
///
/// # Examples
///
/// ```
/// use usenet_stream::utils::sanitize_header_filename;
///
/// assert_eq!(sanitize_header_filename("movie.mkv"), "movie.mkv");
/// assert_eq!(sanitize_header_filename("../etc\r\npasswd"), ".._etc__passwd");
/// assert_eq!(sanitize_header_filename(""), "download");
/// ```
#[must_use]
pub fn sanitize_header_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}
