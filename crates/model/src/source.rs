use crate::class::SourceClass;
use std::path::Path;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reads the classes of one input archive.
///
/// Containers holding several logical images expose them as one flat stream.
/// Classes are handed to `visit` one at a time so callers can discard the
/// ones they do not keep while the archive is still being read.
pub trait ClassSource {
    fn name(&self) -> &str;

    fn can_load(&self, location: &Path) -> bool;

    fn for_each_class(
        &self,
        location: &Path,
        visit: &mut dyn FnMut(SourceClass),
    ) -> Result<(), BoxError>;
}
