pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod utils;

pub use crate::core::{
    ExtractError, Extractor, ExtractorEngine, Format, MediaRecord, RecordKind, SubtitleTrack,
};
