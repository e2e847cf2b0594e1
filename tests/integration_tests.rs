use anyhow::Result;
use std::collections::HashSet;
use url::Url;
use sitegrab::config::Config;
use sitegrab::core::{sort_formats, ExtractError, Extractor, Format, MediaRecord, RecordKind};
use sitegrab::extractors::{
    self, AfreecaTvExtractor, DrTvExtractor, FranceInterExtractor, ItvExtractor, KetnetExtractor,
    PornHdExtractor,
};

fn sample_urls() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "AfreecaTV",
            "http://live.afreecatv.com:8079/app/index.cgi?szType=read_ucc_bbs&szBjId=dailyapril&nStationNo=16711924&nBbsNo=18605867&nTitleNo=36164052&szSkin=",
        ),
        (
            "DRTV",
            "https://www.dr.dk/tv/se/boern/ultra/panisk-paske/panisk-paske-5",
        ),
        (
            "FranceInter",
            "https://www.franceinter.fr/emissions/la-marche-de-l-histoire/la-marche-de-l-histoire-18-decembre-2013",
        ),
        ("ITV", "http://www.itv.com/hub/vera/1a7314a0025"),
        ("Ketnet", "https://www.ketnet.be/kijken/zomerse-filmpjes"),
        (
            "PornHd",
            "http://www.pornhd.com/videos/1962/sierra-day-gets-his-cum-all-over-herself-hd-porn-video",
        ),
    ]
}

#[tokio::test]
async fn test_engine_registers_all_extractors() -> Result<()> {
    let engine = extractors::default_engine(&Config::default());
    assert_eq!(engine.extractors.len(), 6);
    Ok(())
}

#[tokio::test]
async fn test_each_sample_url_dispatches_to_its_extractor() -> Result<()> {
    let engine = extractors::default_engine(&Config::default());

    for (name, sample_url) in sample_urls() {
        let url = Url::parse(sample_url)?;
        let suitable: Vec<_> = engine
            .extractors
            .iter()
            .filter(|e| e.suitable(&url))
            .map(|e| e.name())
            .collect();
        assert_eq!(suitable, vec![name], "wrong dispatch for {}", sample_url);
    }

    Ok(())
}

#[tokio::test]
async fn test_extractors_reject_other_sites() -> Result<()> {
    let config = Config::default();
    let extractors: Vec<Box<dyn Extractor>> = vec![
        Box::new(AfreecaTvExtractor::new(&config)),
        Box::new(DrTvExtractor::new(&config)),
        Box::new(FranceInterExtractor::new(&config)),
        Box::new(ItvExtractor::new(&config)),
        Box::new(KetnetExtractor::new(&config)),
        Box::new(PornHdExtractor::new(&config)),
    ];

    let unrelated = [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://vimeo.com/123456",
        "https://example.com/videos/1962",
    ];

    for extractor in &extractors {
        for candidate in &unrelated {
            assert!(
                !extractor.suitable(&Url::parse(candidate)?),
                "{} claimed {}",
                extractor.name(),
                candidate
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_unsupported_url_yields_unsupported_error() -> Result<()> {
    let mut engine = extractors::default_engine(&Config::default());
    let err = engine
        .extract("https://example.com/some/video")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Unsupported(_)));
    assert!(!err.is_expected());
    Ok(())
}

#[tokio::test]
async fn test_format_ids_unique_in_parsed_playlists() -> Result<()> {
    // two renditions sharing a bitrate must still get distinct ids
    let playlist = r#"base="rtmpe://ondemand.itv.com/vod/"
        [mp4:production/a/SHOW_EP1_SD600_itv1_16x9.mp4]
        [mp4:production/b/SHOW_EP1_SD600_other_16x9.mp4]"#;
    let formats = ItvExtractor::parse_playlist(playlist)?;
    assert_eq!(formats.len(), 2);
    let ids: HashSet<_> = formats.iter().map(|f| f.format_id.clone()).collect();
    assert_eq!(ids.len(), formats.len());
    Ok(())
}

#[tokio::test]
async fn test_sorted_record_serializes_best_first() -> Result<()> {
    let mut formats = vec![
        Format {
            url: "https://cdn/low.mp4".to_string(),
            format_id: "low".to_string(),
            height: Some(360),
            ..Default::default()
        },
        Format {
            url: "https://cdn/high.mp4".to_string(),
            format_id: "high".to_string(),
            height: Some(1080),
            ..Default::default()
        },
    ];
    sort_formats(&mut formats);

    let record = MediaRecord {
        id: "abc123".to_string(),
        title: "A Title".to_string(),
        formats,
        ..Default::default()
    };

    let json = serde_json::to_value(&record)?;
    assert_eq!(json["formats"][0]["format_id"], "high");
    assert_eq!(json["kind"], "video");
    Ok(())
}

#[tokio::test]
async fn test_multi_video_record_shape() -> Result<()> {
    let xml = r#"<result><track>
        <flag>SUCCEED</flag>
        <title>Part series</title>
        <video>
          <file key="p1" duration="10">http://vod/part1.mp4</file>
          <file key="p2" duration="20">http://vod/part2.mp4</file>
        </video>
    </track></result>"#;
    let record = AfreecaTvExtractor::parse_video_info(xml, "36164052")?;
    assert_eq!(record.kind, RecordKind::MultiVideo);
    assert_eq!(record.entries.len(), 2);

    let json = serde_json::to_value(&record)?;
    assert_eq!(json["kind"], "multi_video");
    assert_eq!(json["entries"][1]["id"], "p2");
    Ok(())
}
