//! RCH hydrological time-series files
//!
//! Parsing of the line-oriented RCH flat-file format and the
//! process-lifetime cache of parsed results, keyed by location.

pub mod cache;
pub mod parser;

pub use cache::RchCache;
pub use parser::{parse, parse_named, LineOutcome, RchMetadata, RchParsedData, RchRecord};
