pub mod manifest;

use crate::config::Config;
use crate::core::{ExtractError, Format, Result};
use regex::Regex;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client every extractor shares the configuration of.
pub fn build_client(config: &Config) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout))
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("Failed to create HTTP client")
}

pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    tracing::debug!("Fetching {}", url);
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ExtractError::HttpStatus {
            status: response.status(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Rejects an empty format list as an expected condition: by the time
/// assembly has run, emptiness means the content is gone, not that the
/// page format changed.
pub fn ensure_formats(formats: Vec<Format>) -> Result<Vec<Format>> {
    if formats.is_empty() {
        return Err(ExtractError::Expected(
            "No playable source was found, either the URL is incorrect or the video \
             has been removed."
                .to_string(),
        ));
    }
    Ok(formats)
}

/// Tries each pattern in order and returns the first capture that matches.
/// Patterns with a named `value` group capture that group, otherwise group 1.
pub fn search_regex_opt(patterns: &[&str], text: &str) -> Option<String> {
    for pattern in patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(err) => {
                tracing::warn!("Invalid pattern {}: {}", pattern, err);
                continue;
            }
        };
        if let Some(captures) = re.captures(text) {
            let matched = captures
                .name("value")
                .or_else(|| captures.get(1))
                .or_else(|| captures.get(0));
            if let Some(m) = matched {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

/// Required-field variant of [`search_regex_opt`].
pub fn search_regex(patterns: &[&str], text: &str, name: &'static str) -> Result<String> {
    search_regex_opt(patterns, text).ok_or(ExtractError::UnableToExtract(name))
}

/// Looks up an OpenGraph `<meta>` tag, trying both attribute orders.
pub fn og_search(html: &str, property: &str) -> Option<String> {
    let patterns = [
        format!(
            r#"<meta[^>]+property=["']og:{}["'][^>]+content=["']([^"']*)["']"#,
            property
        ),
        format!(
            r#"<meta[^>]+content=["']([^"']*)["'][^>]+property=["']og:{}["']"#,
            property
        ),
    ];
    for pattern in &patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(html) {
                if let Some(m) = captures.get(1) {
                    let value = unescape_html(m.as_str());
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
    }
    None
}

/// Parses every `application/ld+json` script block that holds valid JSON.
pub fn json_ld_blocks(html: &str) -> Vec<serde_json::Value> {
    let mut blocks = Vec::new();
    if let Ok(re) =
        Regex::new(r#"(?s)<script[^>]+type=["']application/ld\+json["'][^>]*>(.*?)</script>"#)
    {
        for captures in re.captures_iter(html) {
            if let Some(m) = captures.get(1) {
                if let Ok(value) = serde_json::from_str(m.as_str().trim()) {
                    blocks.push(value);
                }
            }
        }
    }
    blocks
}

/// Normalizes a loosely formatted JavaScript object literal into strict
/// JSON: single-quoted strings become double-quoted, bare identifier keys
/// get quoted and trailing commas are dropped.
pub fn js_to_json(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let quote = c;
                i += 1;
                out.push('"');
                while i < chars.len() && chars[i] != quote {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        match chars[i + 1] {
                            '\'' => out.push('\''),
                            '"' => out.push_str("\\\""),
                            other => {
                                out.push('\\');
                                out.push(other);
                            }
                        }
                        i += 2;
                    } else {
                        if chars[i] == '"' {
                            out.push_str("\\\"");
                        } else {
                            out.push(chars[i]);
                        }
                        i += 1;
                    }
                }
                i += 1;
                out.push('"');
            }
            ',' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                // trailing comma before a closing brace/bracket
                if !(j < chars.len() && (chars[j] == '}' || chars[j] == ']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let mut j = i;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let is_key = j < chars.len() && chars[j] == ':';
                if is_key && !matches!(ident.as_str(), "true" | "false" | "null") {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

pub fn unescape_html(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn remove_end(s: &str, end: &str) -> String {
    s.strip_suffix(end).unwrap_or(s).to_string()
}

pub fn mimetype2ext(mime: &str) -> Option<&'static str> {
    match mime.trim() {
        "text/vtt" | "text/webvtt" => Some("vtt"),
        "application/ttml+xml" | "application/ttaf+xml" => Some("ttml"),
        "text/srt" | "application/x-subrip" => Some("srt"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "application/x-mpegurl" | "application/vnd.apple.mpegurl" => Some("m3u8"),
        _ => None,
    }
}

/// Parses an ISO-8601 timestamp into epoch seconds.
pub fn parse_iso8601(value: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// French month names as they appear on broadcast pages.
/// Extend in place if other spellings show up.
pub fn french_month_number(name: &str) -> Option<u32> {
    let number = match name.to_lowercase().as_str() {
        "janvier" => 1,
        "février" | "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "août" | "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "décembre" | "decembre" => 12,
        _ => return None,
    };
    Some(number)
}

/// Resolves a possibly relative URL against the document it came from.
pub fn resolve_url(base: &str, candidate: &str) -> String {
    if candidate.contains("://") {
        return candidate.to_string();
    }
    Url::parse(base)
        .ok()
        .and_then(|b| b.join(candidate).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| candidate.to_string())
}
