use crate::config::Config;
use crate::core::{ExtractError, Extractor, Format, MediaRecord, RecordKind, Result};
use crate::utils;
use async_trait::async_trait;
use regex::Regex;
use url::Url;

/// afreecatv.com VODs. The public player URLs carry an `nTitleNo` query
/// parameter; the actual metadata lives behind an internal XML API that
/// reuses the same query string.
pub struct AfreecaTvExtractor {
    client: reqwest::Client,
}

impl AfreecaTvExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            client: utils::build_client(config),
        }
    }

    pub fn extract_video_id(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        let host_ok = Regex::new(r"^(?:(?:live|afbbs|www)\.)?afreeca(?:tv)?\.com$")
            .ok()?
            .is_match(host);
        if !host_ok {
            return None;
        }
        let path_ok = Regex::new(r"^/(?:app/(?:index|read_ucc_bbs)\.cgi|player/[Pp]layer\.(?:swf|html))$")
            .ok()?
            .is_match(url.path());
        if !path_ok {
            return None;
        }
        url.query_pairs()
            .find(|(key, _)| key == "nTitleNo")
            .map(|(_, value)| value.to_string())
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
    }

    /// Rewrites the player URL to the video-info API endpoint, keeping the
    /// query string intact.
    fn info_url(url: &Url) -> Result<Url> {
        let mut info_url = url.clone();
        info_url.set_host(Some("afbbs.afreecatv.com"))?;
        info_url
            .set_port(Some(8080))
            .map_err(|_| ExtractError::UnableToExtract("video info URL"))?;
        info_url.set_path("/api/video/get_video_info.php");
        Ok(info_url)
    }

    pub fn parse_video_info(xml: &str, video_id: &str) -> Result<MediaRecord> {
        let doc = roxmltree::Document::parse(xml)?;

        let track_text = |name: &str| -> Option<String> {
            doc.descendants()
                .find(|n| n.tag_name().name() == name)
                .and_then(|n| n.text())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        };

        if track_text("flag").as_deref() != Some("SUCCEED") {
            return Err(ExtractError::Expected(
                "Specified AfreecaTV video does not exist".to_string(),
            ));
        }

        let title = track_text("title").ok_or(ExtractError::UnableToExtract("title"))?;
        let uploader = track_text("nickname");
        let uploader_id = track_text("bj_id");
        let duration = track_text("duration").and_then(|d| d.parse::<f64>().ok());
        let thumbnail = track_text("titleImage");

        let mut entries = Vec::new();
        if let Some(video) = doc.descendants().find(|n| n.tag_name().name() == "video") {
            for file in video.children().filter(|n| n.tag_name().name() == "file") {
                let Some(file_url) = file.text().map(str::trim).filter(|t| !t.is_empty()) else {
                    continue;
                };
                entries.push(MediaRecord {
                    id: file.attribute("key").unwrap_or_default().to_string(),
                    title: title.clone(),
                    duration: file.attribute("duration").and_then(|d| d.parse().ok()),
                    formats: vec![Format {
                        url: file_url.to_string(),
                        format_id: "direct".to_string(),
                        ..Default::default()
                    }],
                    ..Default::default()
                });
            }
        }

        let mut record = MediaRecord {
            id: video_id.to_string(),
            title,
            uploader,
            uploader_id,
            duration,
            thumbnail,
            ..Default::default()
        };

        match entries.len() {
            0 => Err(ExtractError::Expected(
                "No files found for the specified AfreecaTV video, either the URL \
                 is incorrect or the video has been made private."
                    .to_string(),
            )),
            // a single part collapses into the parent record
            1 => {
                record.formats = entries.remove(0).formats;
                Ok(record)
            }
            _ => {
                record.kind = RecordKind::MultiVideo;
                record.entries = entries;
                Ok(record)
            }
        }
    }
}

#[async_trait]
impl Extractor for AfreecaTvExtractor {
    fn name(&self) -> &'static str {
        "AfreecaTV"
    }

    fn suitable(&self, url: &Url) -> bool {
        self.extract_video_id(url).is_some()
    }

    async fn extract(&mut self, url: &Url) -> Result<MediaRecord> {
        let video_id = self
            .extract_video_id(url)
            .ok_or(ExtractError::UnableToExtract("video id"))?;
        let info_url = Self::info_url(url)?;
        tracing::debug!("Downloading AfreecaTV video info for {}", video_id);
        let xml = utils::fetch_text(&self.client, info_url.as_str()).await?;
        Self::parse_video_info(&xml, &video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_URL: &str = "http://live.afreecatv.com:8079/app/index.cgi?szType=read_ucc_bbs&szBjId=dailyapril&nStationNo=16711924&nBbsNo=18605867&nTitleNo=36164052&szSkin=";

    fn extractor() -> AfreecaTvExtractor {
        AfreecaTvExtractor::new(&Config::default())
    }

    fn info_xml(files: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<result>
  <track>
    <flag>SUCCEED</flag>
    <title>데일리 에이프릴 요정들의 시상식!</title>
    <nickname>dailyapril</nickname>
    <bj_id>dailyapril</bj_id>
    <duration>6164</duration>
    <titleImage>http://videoimg.afreecatv.com/thumb.jpg</titleImage>
    <video>{}</video>
  </track>
</result>"#,
            files
        )
    }

    #[test]
    fn test_url_matching() {
        let extractor = extractor();
        let id = extractor.extract_video_id(&Url::parse(SAMPLE_URL).unwrap());
        assert_eq!(id.as_deref(), Some("36164052"));

        let player = Url::parse(
            "http://afreeca.com/player/Player.swf?szType=szBjId=djleegoon&nStationNo=11273158&nBbsNo=13161095&nTitleNo=36327652",
        )
        .unwrap();
        assert_eq!(
            extractor.extract_video_id(&player).as_deref(),
            Some("36327652")
        );

        assert!(extractor
            .extract_video_id(&Url::parse("https://www.dr.dk/tv/se/x/y").unwrap())
            .is_none());
        assert!(extractor
            .extract_video_id(&Url::parse("http://www.afreecatv.com/app/index.cgi?szBjId=x").unwrap())
            .is_none());
    }

    #[test]
    fn test_info_url_rewrite() {
        let info = AfreecaTvExtractor::info_url(&Url::parse(SAMPLE_URL).unwrap()).unwrap();
        assert_eq!(
            info.as_str(),
            "http://afbbs.afreecatv.com:8080/api/video/get_video_info.php?szType=read_ucc_bbs&szBjId=dailyapril&nStationNo=16711924&nBbsNo=18605867&nTitleNo=36164052&szSkin="
        );
    }

    #[test]
    fn test_failed_flag_is_expected_error() {
        let xml = r#"<result><track><flag>FAIL</flag></track></result>"#;
        let err = AfreecaTvExtractor::parse_video_info(xml, "36164052").unwrap_err();
        assert!(err.is_expected());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_single_file_collapses_into_parent() {
        let xml = info_xml(
            r#"<file key="20170302_1" duration="6164">http://vod.afreecatv.com/part1.mp4</file>"#,
        );
        let record = AfreecaTvExtractor::parse_video_info(&xml, "36164052").unwrap();
        assert_eq!(record.kind, RecordKind::Video);
        assert!(record.entries.is_empty());
        assert_eq!(record.formats.len(), 1);
        assert_eq!(record.formats[0].url, "http://vod.afreecatv.com/part1.mp4");
        assert_eq!(record.uploader.as_deref(), Some("dailyapril"));
        assert_eq!(record.duration, Some(6164.0));
        assert_eq!(
            record.thumbnail.as_deref(),
            Some("http://videoimg.afreecatv.com/thumb.jpg")
        );
    }

    #[test]
    fn test_multiple_files_become_multi_video() {
        let xml = info_xml(
            r#"<file key="20170302_1" duration="3000">http://vod.afreecatv.com/part1.mp4</file>
               <file key="20170302_2" duration="3164">http://vod.afreecatv.com/part2.mp4</file>"#,
        );
        let record = AfreecaTvExtractor::parse_video_info(&xml, "36164052").unwrap();
        assert_eq!(record.kind, RecordKind::MultiVideo);
        assert!(record.formats.is_empty());
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.entries[0].id, "20170302_1");
        assert_eq!(record.entries[0].duration, Some(3000.0));
        assert_eq!(record.entries[1].formats[0].url, "http://vod.afreecatv.com/part2.mp4");
    }

    #[test]
    fn test_no_files_is_expected_error() {
        let xml = info_xml("");
        let err = AfreecaTvExtractor::parse_video_info(&xml, "36164052").unwrap_err();
        assert!(err.is_expected());
        assert!(err.to_string().contains("No files found"));
    }
}
