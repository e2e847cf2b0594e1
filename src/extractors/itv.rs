use crate::config::Config;
use crate::core::{sort_formats, ExtractError, Extractor, Format, MediaRecord, Result, SubtitleTrack};
use crate::utils;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use url::Url;

const PLAYLIST_SERVICE_URL: &str = "http://mercury.itv.com/PlaylistService.svc";
const PLAYER_URL: &str = "http://www.itv.com/mercury/Mercury_VideoPlayer.swf";
const PLAYER_REFERRER: &str =
    "http://www.itv.com/mercury/Mercury_VideoPlayer.swf?v=1.5.309/[[DYNAMIC]]/2";
const SOAP_ACTION: &str = "\"http://tempuri.org/PlaylistService/GetPlaylist\"";

/// GetPlaylist SOAP envelope; `{production_id}` is substituted before the
/// POST.
const SOAP_ENVELOPE: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tem="http://tempuri.org/" xmlns:itv="http://schemas.datacontract.org/2004/07/Itv.BB.Mercury.Common.Types" xmlns:com="http://schemas.itv.com/2009/05/Common">
  <soapenv:Header/>
  <soapenv:Body>
    <tem:GetPlaylist>
      <tem:request>
        <itv:ProductionId>{production_id}</itv:ProductionId>
        <itv:RequestGuid>FFFFFFFF-FFFF-FFFF-FFFF-FFFFFFFFFFFF</itv:RequestGuid>
        <itv:Vodcrid>
          <com:Id/>
          <com:Partition>itv.com</com:Partition>
        </itv:Vodcrid>
      </tem:request>
      <tem:userInfo>
        <itv:Broadcaster>Itv</itv:Broadcaster>
        <itv:GeoLocationToken>
          <itv:Token/>
        </itv:GeoLocationToken>
        <itv:RevenueScienceValue>ITVPLAYER.12.18.4</itv:RevenueScienceValue>
        <itv:SessionId/>
        <itv:SsoToken/>
        <itv:UserToken/>
      </tem:userInfo>
      <tem:siteInfo>
        <itv:AdvertisingRestriction>None</itv:AdvertisingRestriction>
        <itv:AdvertisingSite>ITV</itv:AdvertisingSite>
        <itv:AdvertisingType>Any</itv:AdvertisingType>
        <itv:Area>ITVPLAYER.VIDEO</itv:Area>
        <itv:Category/>
        <itv:Platform>DotCom</itv:Platform>
        <itv:Site>ItvCom</itv:Site>
      </tem:siteInfo>
      <tem:deviceInfo>
        <itv:ScreenSize>Big</itv:ScreenSize>
      </tem:deviceInfo>
      <tem:playerInfo>
        <itv:Version>2</itv:Version>
      </tem:playerInfo>
    </tem:GetPlaylist>
  </soapenv:Body>
</soapenv:Envelope>
"#;

/// itv.com hub episodes. Metadata comes from the page's JSON-LD; the RTMP
/// playlist is fetched with a SOAP request to the Mercury playlist service.
pub struct ItvExtractor {
    client: reqwest::Client,
}

impl ItvExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            client: utils::build_client(config),
        }
    }

    pub fn extract_video_id(&self, url: &Url) -> Option<String> {
        Regex::new(r"^http://www\.itv\.com/hub/[-\w]+/([A-Z]*[\da-f]+)$")
            .ok()?
            .captures(url.as_str())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Pulls the RTMP renditions out of the playlist response. The play
    /// paths are resolution-coded mp4 tokens; the trailing digits of the
    /// encoding tag carry the bitrate.
    pub fn parse_playlist(playlist: &str) -> Result<Vec<Format>> {
        let rtmp_base = utils::search_regex(&[r#"base="(rtmp[^"]+)""#], playlist, "rtmp base")?;

        let patterns = [
            r"(?i)(mp4:[^\]]+_[A-Z]+([0-9]{3,4})(?:|_[^\]]+)_(?:16|4)[-x](?:9|3)[^\]]*\.mp4)",
            r"(?i)(mp4:[^\]]+_PC01([0-9]{3,4})(?:|_[^\]]+)_(?:16|4)[-x](?:9|3)[^\]]*\.mp4)",
        ];

        let mut formats: Vec<Format> = Vec::new();
        let mut seen_paths = HashSet::new();
        let mut used_ids = HashSet::new();
        for pattern in &patterns {
            if let Ok(re) = Regex::new(pattern) {
                for captures in re.captures_iter(playlist) {
                    let Some(play_path) = captures.get(1).map(|m| m.as_str().to_string()) else {
                        continue;
                    };
                    if !seen_paths.insert(play_path.clone()) {
                        continue;
                    }
                    let tbr = captures
                        .get(2)
                        .and_then(|m| m.as_str().parse::<f64>().ok());
                    let base_id = match tbr {
                        Some(tbr) => format!("rtmp-{}", tbr as u64),
                        None => "rtmp".to_string(),
                    };
                    // ids stay unique even when two renditions share a bitrate
                    let mut format_id = base_id.clone();
                    let mut suffix = 2;
                    while !used_ids.insert(format_id.clone()) {
                        format_id = format!("{}-{}", base_id, suffix);
                        suffix += 1;
                    }
                    formats.push(Format {
                        url: rtmp_base.clone(),
                        play_path: Some(play_path),
                        format_id,
                        protocol: Some("rtmp".to_string()),
                        tbr,
                        ext: Some("flv".to_string()),
                        no_resume: true,
                        player_url: Some(PLAYER_URL.to_string()),
                        ..Default::default()
                    });
                }
            }
        }
        Ok(formats)
    }

    pub fn parse_subtitles(playlist: &str) -> HashMap<String, Vec<SubtitleTrack>> {
        let mut subtitles = HashMap::new();
        if let Some(subtitle_url) = utils::search_regex_opt(
            &[r"<URL><!\[CDATA\[(http://subtitles\.[^\]]*)\]\]></URL>"],
            playlist,
        ) {
            subtitles.insert(
                "en".to_string(),
                vec![SubtitleTrack {
                    url: subtitle_url,
                    ext: "ttml".to_string(),
                }],
            );
        }
        subtitles
    }

    fn json_ld_field(blocks: &[serde_json::Value], key: &str) -> Option<String> {
        blocks
            .iter()
            .find_map(|block| block.get(key).and_then(|v| v.as_str()))
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl Extractor for ItvExtractor {
    fn name(&self) -> &'static str {
        "ITV"
    }

    fn suitable(&self, url: &Url) -> bool {
        self.extract_video_id(url).is_some()
    }

    async fn extract(&mut self, url: &Url) -> Result<MediaRecord> {
        let webpage = utils::fetch_text(&self.client, url.as_str()).await?;

        let json_ld = utils::json_ld_blocks(&webpage);
        let series = Self::json_ld_field(&json_ld, "series")
            .ok_or(ExtractError::UnableToExtract("series"))?;
        let episode = Self::json_ld_field(&json_ld, "episode");
        let description = Self::json_ld_field(&json_ld, "description");

        let production_id =
            utils::search_regex(&[r#"productionId=([\dA-Fa-f%]+)""#], &webpage, "production id")?;
        let production_id = urlencoding::decode(&production_id)
            .map_err(|_| ExtractError::UnableToExtract("production id"))?
            .into_owned();

        tracing::debug!("Downloading program data for {}", production_id);
        let body = SOAP_ENVELOPE.replace("{production_id}", &production_id);
        let response = self
            .client
            .post(PLAYLIST_SERVICE_URL)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("Referrer", PLAYER_REFERRER)
            .header("SOAPAction", SOAP_ACTION)
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ExtractError::HttpStatus {
                status: response.status(),
                url: PLAYLIST_SERVICE_URL.to_string(),
            });
        }
        let playlist = response.text().await?;

        let mut formats = utils::ensure_formats(Self::parse_playlist(&playlist)?)?;
        sort_formats(&mut formats);
        let subtitles = Self::parse_subtitles(&playlist);

        Ok(MediaRecord {
            id: production_id,
            title: series.clone(),
            series: Some(series),
            episode,
            description,
            formats,
            subtitles,
            ..Default::default()
        })
    }
}
