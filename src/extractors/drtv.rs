use crate::config::Config;
use crate::core::{sort_formats, ExtractError, Extractor, Format, MediaRecord, Result, SubtitleTrack};
use crate::utils::{self, manifest};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

const PROGRAMCARD_URL: &str = "http://www.dr.dk/mu/programcard/expanded";
const UNAVAILABLE_BANNER: &str = ">Programmet er ikke længere tilgængeligt";
const HDS_QUERY: &str = "?hdcore=3.3.0&plugin=aasp-3.3.0.99.43";

/// dr.dk programs and news clips, backed by the "programcard" JSON API.
pub struct DrTvExtractor {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Programcard {
    data: Vec<ProgramData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProgramData {
    title: Option<String>,
    description: Option<String>,
    created_time: Option<String>,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Asset {
    kind: Option<String>,
    uri: Option<String>,
    duration_in_milliseconds: Option<f64>,
    restricted_to_denmark: Option<bool>,
    target: Option<String>,
    #[serde(default)]
    links: Vec<AssetLink>,
    subtitles_list: Option<Vec<SubtitleEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssetLink {
    uri: Option<String>,
    target: Option<String>,
    bitrate: Option<f64>,
    file_format: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubtitleEntry {
    uri: Option<String>,
    language: Option<String>,
    mime_type: Option<String>,
}

/// Everything the asset walk produces except the manifest expansions,
/// which need further fetches.
#[derive(Debug, Default)]
struct AssetSummary {
    thumbnail: Option<String>,
    duration: Option<f64>,
    restricted_to_denmark: bool,
    formats: Vec<Format>,
    /// (manifest URI, format id, preference) per adaptive link.
    hls: Vec<(String, String, Option<i32>)>,
    hds: Vec<(String, String, Option<i32>)>,
    subtitles: HashMap<String, Vec<SubtitleTrack>>,
}

/// Subtitle language names used by the programcard API.
/// Extend in place as more show up.
fn subtitle_lang(language: &str) -> &str {
    match language {
        "Danish" => "da",
        other => other,
    }
}

impl DrTvExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            client: utils::build_client(config),
        }
    }

    pub fn extract_video_id(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        if host != "dr.dk" && host != "www.dr.dk" {
            return None;
        }
        Regex::new(r"^/(?:tv/se|nyheder)(?:/[^/?#]+)*?/([\da-z-]+)/?$")
            .ok()?
            .captures(url.path())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn check_available(webpage: &str, video_id: &str) -> Result<()> {
        if webpage.contains(UNAVAILABLE_BANNER) {
            return Err(ExtractError::Expected(format!(
                "Video {} is not available",
                video_id
            )));
        }
        Ok(())
    }

    /// Empty-list branching after assembly: a restriction flag seen during
    /// the asset walk means geo-blocking, anything else means the content
    /// is gone.
    fn ensure_formats(formats: Vec<Format>, restricted_to_denmark: bool) -> Result<Vec<Format>> {
        if formats.is_empty() && restricted_to_denmark {
            return Err(ExtractError::GeoRestricted(
                "Unfortunately, DR is not allowed to show this program outside Denmark."
                    .to_string(),
            ));
        }
        utils::ensure_formats(formats)
    }

    fn parse_programcard(json: &str) -> Result<ProgramData> {
        let card: Programcard = serde_json::from_str(json)?;
        card.data
            .into_iter()
            .next()
            .ok_or(ExtractError::UnableToExtract("program data"))
    }

    fn collect_assets(data: &ProgramData) -> AssetSummary {
        let mut summary = AssetSummary::default();

        for asset in &data.assets {
            match asset.kind.as_deref() {
                Some("Image") => summary.thumbnail = asset.uri.clone(),
                Some("VideoResource") => {
                    summary.duration = asset.duration_in_milliseconds.map(|ms| ms / 1000.0);
                    summary.restricted_to_denmark |=
                        asset.restricted_to_denmark.unwrap_or(false);
                    let spoken_subtitles = asset.target.as_deref() == Some("SpokenSubtitles");
                    let preference = spoken_subtitles.then_some(-1);

                    for link in &asset.links {
                        let Some(uri) = link.uri.clone().filter(|u| !u.is_empty()) else {
                            continue;
                        };
                        let mut format_id = link.target.clone().unwrap_or_default();
                        if spoken_subtitles {
                            format_id.push_str("-spoken-subtitles");
                        }
                        match link.target.as_deref() {
                            Some("HDS") => {
                                summary.hds.push((uri, format_id, preference));
                            }
                            Some("HLS") => {
                                summary.hls.push((uri, format_id, preference));
                            }
                            _ => {
                                if let Some(bitrate) = link.bitrate {
                                    format_id.push_str(&format!("-{}", bitrate.round() as u64));
                                }
                                summary.formats.push(Format {
                                    url: uri,
                                    format_id,
                                    tbr: link.bitrate,
                                    ext: link.file_format.clone(),
                                    preference,
                                    ..Default::default()
                                });
                            }
                        }
                    }

                    for subs in asset.subtitles_list.iter().flatten() {
                        let Some(sub_uri) = subs.uri.clone().filter(|u| !u.is_empty()) else {
                            continue;
                        };
                        let language = subs.language.as_deref().unwrap_or("da");
                        let ext = subs
                            .mime_type
                            .as_deref()
                            .and_then(utils::mimetype2ext)
                            .unwrap_or("vtt");
                        summary
                            .subtitles
                            .entry(subtitle_lang(language).to_string())
                            .or_default()
                            .push(SubtitleTrack {
                                url: sub_uri,
                                ext: ext.to_string(),
                            });
                    }
                }
                _ => {}
            }
        }

        summary
    }
}

#[async_trait]
impl Extractor for DrTvExtractor {
    fn name(&self) -> &'static str {
        "DRTV"
    }

    fn suitable(&self, url: &Url) -> bool {
        self.extract_video_id(url).is_some()
    }

    async fn extract(&mut self, url: &Url) -> Result<MediaRecord> {
        let slug = self
            .extract_video_id(url)
            .ok_or(ExtractError::UnableToExtract("video id"))?;

        let webpage = utils::fetch_text(&self.client, url.as_str()).await?;
        Self::check_available(&webpage, &slug)?;

        let video_id = utils::search_regex(
            &[
                r#"data-(?:material-identifier|episode-slug)="([^"]+)""#,
                r#"data-resource="[^>"]+mu/programcard/expanded/([^"]+)""#,
            ],
            &webpage,
            "video id",
        )?;

        tracing::debug!("Downloading video JSON for {}", video_id);
        let json = utils::fetch_text(
            &self.client,
            &format!("{}/{}", PROGRAMCARD_URL, video_id),
        )
        .await?;
        let data = Self::parse_programcard(&json)?;

        let title = utils::og_search(&webpage, "title")
            .map(|t| utils::remove_end(&t, " | TV | DR"))
            .or_else(|| data.title.clone())
            .ok_or(ExtractError::UnableToExtract("title"))?;
        let description = utils::og_search(&webpage, "description").or_else(|| data.description.clone());
        let timestamp = data.created_time.as_deref().and_then(utils::parse_iso8601);

        let summary = Self::collect_assets(&data);
        let mut formats = summary.formats;
        for (uri, format_id, preference) in &summary.hds {
            formats.extend(
                manifest::extract_f4m_formats(
                    &self.client,
                    &format!("{}{}", uri, HDS_QUERY),
                    format_id,
                    *preference,
                )
                .await?,
            );
        }
        for (uri, format_id, preference) in &summary.hls {
            formats.extend(
                manifest::extract_m3u8_formats(&self.client, uri, format_id, *preference).await?,
            );
        }

        let mut formats = Self::ensure_formats(formats, summary.restricted_to_denmark)?;
        sort_formats(&mut formats);

        Ok(MediaRecord {
            id: video_id,
            title,
            description,
            thumbnail: summary.thumbnail,
            timestamp,
            duration: summary.duration,
            formats,
            subtitles: summary.subtitles,
            ..Default::default()
        })
    }
}
