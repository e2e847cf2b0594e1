use crate::config::Config;
use crate::core::{ExtractError, Extractor, Format, MediaRecord, Result};
use crate::utils;
use async_trait::async_trait;
use url::Url;

/// franceinter.fr broadcast pages. Audio only; the stream URL sits in a
/// `data-url` attribute of the play button.
pub struct FranceInterExtractor {
    client: reqwest::Client,
}

impl FranceInterExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            client: utils::build_client(config),
        }
    }

    pub fn extract_video_id(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        if host != "franceinter.fr" && host != "www.franceinter.fr" {
            return None;
        }
        url.path()
            .strip_prefix("/emissions/")
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
    }

    /// Turns "18 décembre 2013" into "20131218". The month goes through an
    /// explicit name table; unknown months yield None.
    pub fn parse_french_date(text: &str) -> Option<String> {
        let mut parts = text.split_whitespace();
        let day: u32 = parts.next()?.parse().ok()?;
        let month = utils::french_month_number(parts.next()?)?;
        let year: u32 = parts.next()?.parse().ok()?;
        Some(format!("{}{:02}{:02}", year, month, day))
    }
}

#[async_trait]
impl Extractor for FranceInterExtractor {
    fn name(&self) -> &'static str {
        "FranceInter"
    }

    fn suitable(&self, url: &Url) -> bool {
        self.extract_video_id(url).is_some()
    }

    async fn extract(&mut self, url: &Url) -> Result<MediaRecord> {
        let video_id = self
            .extract_video_id(url)
            .ok_or(ExtractError::UnableToExtract("video id"))?;

        let webpage = utils::fetch_text(&self.client, url.as_str()).await?;

        let video_url = utils::search_regex(
            &[
                r#"(?s)<div[^>]+class=["']page-diffusion["'][^>]*>.*?<button[^>]+data-url="(?P<value>[^"]+)""#,
                r#"(?s)<div[^>]+class=["']page-diffusion["'][^>]*>.*?<button[^>]+data-url='(?P<value>[^']+)'"#,
            ],
            &webpage,
            "video url",
        )?;

        let title = utils::og_search(&webpage, "title")
            .ok_or(ExtractError::UnableToExtract("title"))?;
        let description = utils::og_search(&webpage, "description");

        let upload_date = utils::search_regex_opt(
            &[r#"class=["']cover-emission-period["'][^>]*>[^<]+\s+(\d{1,2}\s+\S+\s+\d{4})<"#],
            &webpage,
        )
        .and_then(|date| Self::parse_french_date(&date));

        Ok(MediaRecord {
            id: video_id,
            title,
            description,
            upload_date,
            formats: vec![Format {
                url: video_url,
                format_id: "direct".to_string(),
                vcodec: Some("none".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        })
    }
}
