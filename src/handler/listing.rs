//! Directory listing module
//!
//! Renders an HTML index of a directory's immediate children.

use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write as _;
use std::time::SystemTime;

use super::resolve::ResolvedTarget;
use crate::error::ServeError;
use crate::http::conditional::format_last_modified;

/// Characters escaped inside a single path segment of an href
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug)]
struct Entry {
    name: String,
    is_dir: bool,
    size: u64,
    modified: Option<SystemTime>,
}

/// Build the listing page for a directory target
pub async fn generate_listing(dir: &ResolvedTarget) -> Result<String, ServeError> {
    let mut read_dir = tokio::fs::read_dir(&dir.path)
        .await
        .map_err(ServeError::DirectoryRead)?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(ServeError::DirectoryRead)?
    {
        // Entry removed between readdir and stat
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(render(&dir.url_path, &entries))
}

fn render(url_path: &str, entries: &[Entry]) -> String {
    let title = encode_text(url_path);
    let base = encode_path(url_path);

    let mut html = String::with_capacity(256 + entries.len() * 128);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>.dir {{ font-weight: bold }}</style></head><body><h1>{title}</h1><ul>\n"
    );

    if let Some(parent) = parent_path(url_path) {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\" class=\"dir\">..</a></li>",
            encode_path(parent)
        );
    }

    for entry in entries {
        let name = encode_text(&entry.name);
        let encoded = utf8_percent_encode(&entry.name, SEGMENT).to_string();
        let href = encode_double_quoted_attribute(&encoded);
        let modified = entry
            .modified
            .map_or_else(|| "-".to_string(), format_last_modified);
        if entry.is_dir {
            let _ = writeln!(
                html,
                "<li><a href=\"{base}{href}/\" class=\"dir\">{name}/</a>, dir, last modified {modified}</li>"
            );
        } else {
            let _ = writeln!(
                html,
                "<li><a href=\"{base}{href}\" class=\"file\">{name}</a>, file, {} bytes, last modified {modified}</li>",
                entry.size
            );
        }
    }

    html.push_str("</ul></body></html>\n");
    html
}

/// Parent of a directory url (`/a/b/` -> `/a/`), `None` at the root
fn parent_path(url_path: &str) -> Option<&str> {
    let trimmed = url_path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    trimmed.rfind('/').map(|i| &trimmed[..=i])
}

/// Percent-encode every segment of a `/`-separated path
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
