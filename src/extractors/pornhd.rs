use crate::config::Config;
use crate::core::{sort_formats, ExtractError, Extractor, Format, MediaRecord, Result};
use crate::utils;
use async_trait::async_trait;
use regex::Regex;
use url::Url;

/// pornhd.com videos. The stream variants live in a `'sources'` JavaScript
/// object keyed by resolution ("720p" etc.).
pub struct PornHdExtractor {
    client: reqwest::Client,
}

impl PornHdExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            client: utils::build_client(config),
        }
    }

    pub fn match_url(&self, url: &Url) -> Option<(String, Option<String>)> {
        let host = url.host_str()?;
        if host != "pornhd.com" && host != "www.pornhd.com" {
            return None;
        }
        let captures = Regex::new(r"^/(?:[a-z]{2,4}/)?videos/(\d+)(?:/([^/?#]+))?/?$")
            .ok()?
            .captures(url.path())?;
        let video_id = captures.get(1)?.as_str().to_string();
        let display_id = captures.get(2).map(|m| m.as_str().to_string());
        Some((video_id, display_id))
    }

    pub fn parse_sources(webpage: &str) -> Result<Vec<Format>> {
        let blob = utils::search_regex(
            &[r"(?s)'sources'\s*:\s*(\{.+?\})\s*\}[;,)]"],
            webpage,
            "sources",
        )?;
        let sources: serde_json::Value = serde_json::from_str(&utils::js_to_json(&blob))?;

        let mut formats = Vec::new();
        if let Some(map) = sources.as_object() {
            for (format_id, value) in map {
                let Some(video_url) = value.as_str().filter(|u| !u.is_empty()) else {
                    continue;
                };
                let height = utils::search_regex_opt(&[r"^(\d+)[pP]"], format_id)
                    .and_then(|h| h.parse::<u32>().ok());
                formats.push(Format {
                    url: video_url.to_string(),
                    format_id: format_id.clone(),
                    height,
                    ..Default::default()
                });
            }
        }
        Ok(formats)
    }
}

#[async_trait]
impl Extractor for PornHdExtractor {
    fn name(&self) -> &'static str {
        "PornHd"
    }

    fn suitable(&self, url: &Url) -> bool {
        self.match_url(url).is_some()
    }

    async fn extract(&mut self, url: &Url) -> Result<MediaRecord> {
        let (video_id, display_id) = self
            .match_url(url)
            .ok_or(ExtractError::UnableToExtract("video id"))?;

        let webpage = utils::fetch_text(&self.client, url.as_str()).await?;

        let title = utils::search_regex(
            &[
                r#"<span[^>]+class=["']video-name["'][^>]*>([^<]+)"#,
                r"<title>(.+?) - .*?[Pp]ornHD.*?</title>",
            ],
            &webpage,
            "title",
        )?;
        let description = utils::search_regex_opt(
            &[
                r#"<div[^>]+class="description"[^>]*>(?P<value>[^<]+)</div"#,
                r#"<p[^>]+class="description"[^>]*>(?P<value>[^<]+)</p"#,
            ],
            &webpage,
        );
        let view_count = utils::search_regex_opt(&[r"(\d+) views\s*<"], &webpage)
            .and_then(|count| count.parse::<u64>().ok());
        let thumbnail = utils::search_regex_opt(&[r"'poster'\s*:\s*'([^']+)'"], &webpage);

        let mut formats = utils::ensure_formats(Self::parse_sources(&webpage)?)?;
        sort_formats(&mut formats);

        Ok(MediaRecord {
            id: video_id,
            display_id,
            title: utils::unescape_html(title.trim()),
            description,
            thumbnail,
            view_count,
            age_limit: Some(18),
            formats,
            ..Default::default()
        })
    }
}
