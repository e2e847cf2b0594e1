pub mod afreecatv;
pub mod drtv;
pub mod franceinter;
pub mod itv;
pub mod ketnet;
pub mod pornhd;

pub use afreecatv::AfreecaTvExtractor;
pub use drtv::DrTvExtractor;
pub use franceinter::FranceInterExtractor;
pub use itv::ItvExtractor;
pub use ketnet::KetnetExtractor;
pub use pornhd::PornHdExtractor;

use crate::config::Config;
use crate::core::{Extractor, ExtractorEngine};

/// All built-in extractors, in dispatch order.
pub fn all(config: &Config) -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(AfreecaTvExtractor::new(config)),
        Box::new(DrTvExtractor::new(config)),
        Box::new(FranceInterExtractor::new(config)),
        Box::new(ItvExtractor::new(config)),
        Box::new(KetnetExtractor::new(config)),
        Box::new(PornHdExtractor::new(config)),
    ]
}

pub fn default_engine(config: &Config) -> ExtractorEngine {
    let mut engine = ExtractorEngine::new();
    for extractor in all(config) {
        engine.register_extractor(extractor);
    }
    engine
}
