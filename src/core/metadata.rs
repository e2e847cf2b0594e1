use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Video,
    /// Multi-part content: the playable parts live in `entries`, each a
    /// minimal record of its own.
    MultiVideo,
}

/// Normalized result of one extraction call. Built once, never mutated
/// after being returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub kind: RecordKind,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Epoch seconds of the publication time.
    pub timestamp: Option<i64>,
    /// Upload date as YYYYMMDD.
    pub upload_date: Option<String>,
    pub uploader: Option<String>,
    pub uploader_id: Option<String>,
    pub series: Option<String>,
    pub episode: Option<String>,
    pub display_id: Option<String>,
    pub view_count: Option<u64>,
    /// Minimum viewer age for age-gated content.
    pub age_limit: Option<u32>,
    /// Language code -> ordered subtitle tracks.
    pub subtitles: HashMap<String, Vec<SubtitleTrack>>,
    pub formats: Vec<Format>,
    /// Parts of a `MultiVideo` record, in playback order.
    pub entries: Vec<MediaRecord>,
}

/// One retrievable stream variant of a video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    pub url: String,
    /// Unique within the owning record's format list.
    pub format_id: String,
    pub ext: Option<String>,
    pub height: Option<u32>,
    /// Total bitrate in kbit/s.
    pub tbr: Option<f64>,
    pub vcodec: Option<String>,
    pub protocol: Option<String>,
    /// RTMP play path, combined with the shared base in `url`.
    pub play_path: Option<String>,
    pub player_url: Option<String>,
    /// Extractor-assigned priority; higher sorts first.
    pub preference: Option<i32>,
    pub no_resume: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub ext: String,
}

/// Orders formats best-first: preference, then resolution, then bitrate.
pub fn sort_formats(formats: &mut [Format]) {
    formats.sort_by(|a, b| {
        let key = |f: &Format| {
            (
                f.preference.unwrap_or(0),
                f.height.map(i64::from).unwrap_or(0),
                f.tbr.unwrap_or(0.0),
            )
        };
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, height: Option<u32>, tbr: Option<f64>, preference: Option<i32>) -> Format {
        Format {
            url: format!("https://example.com/{}", id),
            format_id: id.to_string(),
            height,
            tbr,
            preference,
            ..Default::default()
        }
    }

    #[test]
    fn test_sort_formats_best_first() {
        let mut formats = vec![
            format("low", Some(360), Some(500.0), None),
            format("high", Some(1080), Some(4000.0), None),
            format("mid", Some(720), Some(1500.0), None),
        ];
        sort_formats(&mut formats);
        assert_eq!(formats[0].format_id, "high");
        assert_eq!(formats[2].format_id, "low");
    }

    #[test]
    fn test_sort_formats_preference_beats_resolution() {
        let mut formats = vec![
            format("spoken", Some(1080), Some(4000.0), Some(-1)),
            format("normal", Some(360), Some(500.0), None),
        ];
        sort_formats(&mut formats);
        assert_eq!(formats[0].format_id, "normal");
    }

    #[test]
    fn test_sort_formats_bitrate_breaks_ties() {
        let mut formats = vec![
            format("a", None, Some(600.0), None),
            format("b", None, Some(1200.0), None),
        ];
        sort_formats(&mut formats);
        assert_eq!(formats[0].format_id, "b");
    }
}
