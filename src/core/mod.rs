pub mod error;
pub mod extractor;
pub mod metadata;

pub use error::{ExtractError, Result};
pub use extractor::{Extractor, ExtractorEngine};
pub use metadata::{sort_formats, Format, MediaRecord, RecordKind, SubtitleTrack};
