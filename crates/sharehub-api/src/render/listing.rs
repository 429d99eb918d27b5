//! Directory listing page.

use std::fmt::Write;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use sharehub_entity::share::UseLimit;
use sharehub_service::DirectoryListing;

/// Characters left as-is in path segments.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Render a directory listing as a standalone HTML page.
pub fn render_listing(listing: &DirectoryListing) -> String {
    let base = href(&listing.token, &listing.path);
    let title = html_escape(&listing.title);

    let mut html = String::with_capacity(2048);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{title}</h1>");

    let _ = write!(html, "<p class=\"meta\">Uses left: {}", uses_label(listing.uses));
    if let Some(expires_at) = listing.expires_at {
        let _ = write!(
            html,
            " &middot; Expires {}",
            expires_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    let _ = writeln!(
        html,
        " &middot; <a href=\"{base}?download=zip\">Download as ZIP</a></p>"
    );

    html.push_str("<table>\n<tr><th>Name</th><th>Size</th><th>Modified</th></tr>\n");
    if !listing.is_root() {
        let parent = match listing.path.rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        };
        let _ = writeln!(
            html,
            "<tr><td><a href=\"{}\">../</a></td><td></td><td></td></tr>",
            href(&listing.token, parent)
        );
    }

    for entry in &listing.entries {
        let child = if listing.path.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", listing.path, entry.name)
        };
        let suffix = if entry.is_dir { "/" } else { "" };
        let size = if entry.is_dir {
            "-".to_string()
        } else {
            human_size(entry.size)
        };
        let modified = entry
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        let _ = writeln!(
            html,
            "<tr><td><a href=\"{}\">{}{suffix}</a></td><td>{size}</td><td>{modified}</td></tr>",
            href(&listing.token, &child),
            html_escape(&entry.name),
        );
    }
    html.push_str("</table>\n");

    if listing.allow_upload {
        let _ = writeln!(
            html,
            "<form method=\"post\" action=\"{base}\" enctype=\"multipart/form-data\">\n\
             <input type=\"file\" name=\"files\" multiple>\n\
             <button type=\"submit\">Upload</button>\n</form>"
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Absolute, percent-encoded href for a path inside a share.
fn href(token: &str, path: &str) -> String {
    let mut out = format!("/{}", utf8_percent_encode(token, SEGMENT));
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.extend(utf8_percent_encode(segment, SEGMENT));
    }
    out
}

fn uses_label(uses: UseLimit) -> String {
    match uses {
        UseLimit::Unlimited => "unlimited".to_string(),
        UseLimit::Remaining(n) => n.to_string(),
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = "<style>\n\
body{font-family:sans-serif;margin:2em}\n\
table{border-collapse:collapse}\n\
td,th{padding:.25em 1em;text-align:left}\n\
.meta{color:#555}\n\
</style>\n";
