//! Overlay merge of input archives into one type-name keyed map.

use std::collections::BTreeMap;
use std::path::PathBuf;

use apistub_model::{ClassSource, SourceClass, access};
use tracing::{debug, info};

use crate::error::{ExtractError, Result};

/// Every loaded class keyed by type descriptor. Built once, read-only after.
pub type ClassMap = BTreeMap<String, SourceClass>;

/// Inserts `class` unless it is synthetic or its type is already present.
/// Returns whether the class was kept.
pub fn insert_first_wins(classes: &mut ClassMap, class: SourceClass) -> bool {
    if access::is_synthetic(class.access_flags) || classes.contains_key(&class.type_name) {
        return false;
    }
    classes.insert(class.type_name.clone(), class);
    true
}

/// Loads `locations` in order. A class seen in an earlier archive is never
/// replaced by a later one.
pub fn merge_archives(source: &dyn ClassSource, locations: &[PathBuf]) -> Result<ClassMap> {
    let mut classes = ClassMap::new();
    for location in locations {
        if !source.can_load(location) {
            return Err(ExtractError::UnsupportedInput(location.clone()));
        }
        info!("Extract: {}", location.display());
        let mut seen = 0usize;
        let mut kept = 0usize;
        source.for_each_class(location, &mut |class| {
            seen += 1;
            if insert_first_wins(&mut classes, class) {
                kept += 1;
            }
        })?;
        debug!(
            "{}: {} classes read by {}, {} kept",
            location.display(),
            seen,
            source.name(),
            kept
        );
    }
    Ok(classes)
}
