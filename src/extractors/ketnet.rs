use crate::config::Config;
use crate::core::{sort_formats, ExtractError, Extractor, MediaRecord, Result};
use crate::utils::{self, manifest};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// ketnet.be pages. Everything sits in a `playerConfig` JavaScript object
/// embedded in the page; streams are plain HLS.
pub struct KetnetExtractor {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct PlayerConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub program: Option<String>,
    pub episode: Option<String>,
    pub source: Option<PlayerSource>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerSource {
    pub hls: Option<String>,
}

impl KetnetExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            client: utils::build_client(config),
        }
    }

    pub fn extract_video_id(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        if host != "ketnet.be" && host != "www.ketnet.be" {
            return None;
        }
        url.path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(|id| id.to_string())
    }

    pub fn parse_player_config(webpage: &str) -> Result<PlayerConfig> {
        let blob = utils::search_regex(
            &[r"(?s)playerConfig\s*=\s*(\{.+?\})\s*;"],
            webpage,
            "player config",
        )?;
        let config: PlayerConfig = serde_json::from_str(&utils::js_to_json(&blob))?;
        Ok(config)
    }
}

#[async_trait]
impl Extractor for KetnetExtractor {
    fn name(&self) -> &'static str {
        "Ketnet"
    }

    fn suitable(&self, url: &Url) -> bool {
        self.extract_video_id(url).is_some()
    }

    async fn extract(&mut self, url: &Url) -> Result<MediaRecord> {
        let video_id = self
            .extract_video_id(url)
            .ok_or(ExtractError::UnableToExtract("video id"))?;

        let webpage = utils::fetch_text(&self.client, url.as_str()).await?;
        let config = Self::parse_player_config(&webpage)?;

        let title = config.title.ok_or(ExtractError::UnableToExtract("title"))?;
        let hls_url = config
            .source
            .and_then(|source| source.hls)
            .ok_or(ExtractError::UnableToExtract("HLS source"))?;

        let mut formats = utils::ensure_formats(
            manifest::extract_m3u8_formats(&self.client, &hls_url, "hls", None).await?,
        )?;
        sort_formats(&mut formats);

        Ok(MediaRecord {
            id: video_id,
            title,
            description: config.description,
            thumbnail: config.image,
            series: config.program,
            episode: config.episode,
            formats,
            ..Default::default()
        })
    }
}
