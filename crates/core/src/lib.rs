//! Extraction pipeline from dex platform images to stub class archives.

pub mod body;
pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod merge;
pub mod package;
pub mod params;
pub mod reachability;
pub mod transform;
pub mod translate;

pub use config::ExtractorConfig;
pub use error::{ExtractError, Result};
pub use extractor::{ExtractSummary, Extractor};
pub use merge::ClassMap;
pub use package::{OutputTiers, PackageSummary};
pub use reachability::ReferencedSet;
