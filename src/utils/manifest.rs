//! Expansion of adaptive-streaming manifests (HLS `.m3u8`, HDS `.f4m`)
//! into one [`Format`] per contained rendition.

use crate::core::{Format, Result};
use crate::utils::{fetch_text, resolve_url};
use regex::Regex;

pub async fn extract_m3u8_formats(
    client: &reqwest::Client,
    m3u8_url: &str,
    m3u8_id: &str,
    preference: Option<i32>,
) -> Result<Vec<Format>> {
    let playlist = fetch_text(client, m3u8_url).await?;
    Ok(parse_m3u8(&playlist, m3u8_url, m3u8_id, preference))
}

pub async fn extract_f4m_formats(
    client: &reqwest::Client,
    f4m_url: &str,
    f4m_id: &str,
    preference: Option<i32>,
) -> Result<Vec<Format>> {
    let manifest = fetch_text(client, f4m_url).await?;
    parse_f4m(&manifest, f4m_url, f4m_id, preference)
}

/// Parses a master playlist into one format per `#EXT-X-STREAM-INF`
/// variant. A media playlist with no variants yields the playlist URL
/// itself as a single format.
pub fn parse_m3u8(
    playlist: &str,
    playlist_url: &str,
    m3u8_id: &str,
    preference: Option<i32>,
) -> Vec<Format> {
    let mut formats = Vec::new();
    let mut pending: Option<(Option<f64>, Option<u32>)> = None;

    for line in playlist.lines() {
        let line = line.trim();
        if let Some(attrs) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            // anchored so AVERAGE-BANDWIDTH is not picked up
            let tbr = attr_capture(attrs, r"(?:^|,)BANDWIDTH=(\d+)").map(|b| b / 1000.0);
            let height = attr_capture(attrs, r"RESOLUTION=\d+x(\d+)").map(|h| h as u32);
            pending = Some((tbr, height));
        } else if line.is_empty() || line.starts_with('#') {
            continue;
        } else if let Some((tbr, height)) = pending.take() {
            let format_id = match tbr {
                Some(tbr) => format!("{}-{}", m3u8_id, tbr.round() as u64),
                None => format!("{}-{}", m3u8_id, formats.len()),
            };
            formats.push(Format {
                url: resolve_url(playlist_url, line),
                format_id,
                ext: Some("mp4".to_string()),
                protocol: Some("m3u8_native".to_string()),
                tbr,
                height,
                preference,
                ..Default::default()
            });
        }
    }

    if formats.is_empty() && playlist.contains("#EXTM3U") {
        formats.push(Format {
            url: playlist_url.to_string(),
            format_id: m3u8_id.to_string(),
            ext: Some("mp4".to_string()),
            protocol: Some("m3u8_native".to_string()),
            preference,
            ..Default::default()
        });
    }

    formats
}

/// Parses an HDS manifest into one format per `<media>` element.
pub fn parse_f4m(
    manifest: &str,
    manifest_url: &str,
    f4m_id: &str,
    preference: Option<i32>,
) -> Result<Vec<Format>> {
    let doc = roxmltree::Document::parse(manifest)?;

    let base_url = doc
        .descendants()
        .find(|n| n.tag_name().name() == "baseURL")
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(manifest_url)
        .to_string();

    let mut formats = Vec::new();
    for media in doc
        .descendants()
        .filter(|n| n.tag_name().name() == "media")
    {
        let Some(media_url) = media.attribute("url").or_else(|| media.attribute("href")) else {
            continue;
        };
        let tbr = media.attribute("bitrate").and_then(|b| b.parse::<f64>().ok());
        let height = media.attribute("height").and_then(|h| h.parse::<u32>().ok());
        let format_id = match tbr {
            Some(tbr) => format!("{}-{}", f4m_id, tbr.round() as u64),
            None => format!("{}-{}", f4m_id, formats.len()),
        };
        formats.push(Format {
            url: resolve_url(&base_url, media_url),
            format_id,
            ext: Some("flv".to_string()),
            protocol: Some("f4m".to_string()),
            tbr,
            height,
            preference,
            ..Default::default()
        });
    }

    Ok(formats)
}

fn attr_capture(attrs: &str, pattern: &str) -> Option<f64> {
    Regex::new(pattern)
        .ok()?
        .captures(attrs)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER_PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=1328000,RESOLUTION=1024x576,CODECS=\"avc1.77.30, mp4a.40.2\"\n\
variant-576.m3u8\n\
#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=344000,RESOLUTION=512x288\n\
variant-288.m3u8\n";

    #[test]
    fn test_parse_m3u8_master_playlist() {
        let formats = parse_m3u8(
            MASTER_PLAYLIST,
            "http://cdn.example.com/live/index.m3u8",
            "hls",
            None,
        );
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[0].format_id, "hls-1328");
        assert_eq!(formats[0].height, Some(576));
        assert_eq!(formats[0].tbr, Some(1328.0));
        assert_eq!(
            formats[0].url,
            "http://cdn.example.com/live/variant-576.m3u8"
        );
        assert_eq!(formats[1].format_id, "hls-344");
        assert_eq!(formats[1].height, Some(288));
    }

    #[test]
    fn test_parse_m3u8_ignores_average_bandwidth() {
        let playlist = "#EXTM3U\n\
#EXT-X-STREAM-INF:AVERAGE-BANDWIDTH=1000000,BANDWIDTH=1328000,RESOLUTION=1024x576\n\
variant-576.m3u8\n";
        let formats = parse_m3u8(playlist, "http://cdn.example.com/index.m3u8", "hls", None);
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].tbr, Some(1328.0));
        assert_eq!(formats[0].format_id, "hls-1328");
    }

    #[test]
    fn test_parse_m3u8_media_playlist_single_format() {
        let playlist = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:9.8,\nsegment0.ts\n";
        let formats = parse_m3u8(playlist, "http://cdn.example.com/media.m3u8", "hls", None);
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].format_id, "hls");
        assert_eq!(formats[0].url, "http://cdn.example.com/media.m3u8");
    }

    #[test]
    fn test_parse_f4m_manifest() {
        let manifest = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest xmlns="http://ns.adobe.com/f4m/1.0">
  <baseURL>http://cdn.example.com/hds/</baseURL>
  <media url="stream-1000" bitrate="1000" width="1024" height="576"/>
  <media url="stream-400" bitrate="400" width="512" height="288"/>
</manifest>"#;
        let formats = parse_f4m(
            manifest,
            "http://cdn.example.com/manifest.f4m",
            "hds",
            Some(-1),
        )
        .unwrap();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[0].format_id, "hds-1000");
        assert_eq!(formats[0].url, "http://cdn.example.com/hds/stream-1000");
        assert_eq!(formats[0].protocol.as_deref(), Some("f4m"));
        assert_eq!(formats[0].preference, Some(-1));
        assert_eq!(formats[1].height, Some(288));
    }

    #[test]
    fn test_parse_f4m_rejects_garbage() {
        assert!(parse_f4m("not xml at all", "http://x/manifest.f4m", "hds", None).is_err());
    }
}
