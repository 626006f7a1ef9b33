//! Turns a raw `tools/call` result into a [`DocumentRecord`]. Pure; no I/O.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use serde_json::Value as J;

use crate::core::content::ToolContent;
use crate::domain::{DocumentRecord, FetchRequest};

pub fn normalize(request: &FetchRequest, result: &J) -> DocumentRecord {
    let content = ToolContent::of_result(result).into_text();
    let title = extract_title(result, &content);
    let name = document_name(request, &title);
    DocumentRecord::success(name, content, request.url.clone())
}

/// Explicit `title` first, then the first level-1 markdown heading.
pub fn extract_title(result: &J, content: &str) -> String {
    if let Some(title) = result
        .get("title")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
    {
        return title.to_string();
    }
    heading_regex()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn heading_regex() -> Option<&'static Regex> {
    static HEADING: OnceLock<Option<Regex>> = OnceLock::new();
    HEADING
        .get_or_init(|| Regex::new(r"(?m)^#\s+(.+)$").ok())
        .as_ref()
}

pub fn document_name(request: &FetchRequest, title: &str) -> String {
    if let Some(name) = &request.custom_name {
        return name.clone();
    }
    let host = host_of(&request.url);
    if title.is_empty() {
        format!("Web Content [{host}]")
    } else {
        format!("{title} [{host}]")
    }
}

/// Authority of `url` exactly as written (host and any port, minus userinfo);
/// empty if `url` does not parse as an absolute URL with a host.
pub fn host_of(url: &str) -> String {
    let valid = Url::parse(url).is_ok_and(|u| u.has_host());
    let Some((_, rest)) = url.split_once("://").filter(|_| valid) else {
        return String::new();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    match authority.rsplit_once('@') {
        Some((_, host)) => host.to_string(),
        None => authority.to_string(),
    }
}
