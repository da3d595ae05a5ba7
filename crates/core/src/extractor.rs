use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use apistub_classfile::ClassWriter;
use apistub_dex::DexLoader;
use apistub_model::ClassSource;
use tracing::info;

use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::merge::{self, ClassMap};
use crate::package::{ArchivePackager, OutputTiers, PackageSummary};
use crate::reachability::{self, ReferencedSet};
use crate::transform::{self, ClassTransformer, hidden_api};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Classes in the merged map.
    pub classes: usize,
    /// Inaccessible classes found referenced by the public surface.
    pub referenced: usize,
    pub package: PackageSummary,
}

/// Runs the whole pipeline: merge, reachability, transformation and
/// packaging.
pub struct Extractor {
    config: ExtractorConfig,
    source: Box<dyn ClassSource>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_source(config, Box::new(DexLoader::new()))
    }

    pub fn with_source(config: ExtractorConfig, source: Box<dyn ClassSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn load(&self, inputs: &[PathBuf]) -> Result<ClassMap> {
        merge::merge_archives(self.source.as_ref(), inputs)
    }

    pub fn transform(&self, classes: &ClassMap) -> Result<OutputTiers> {
        info!("Searching for referenced inaccessible classes");
        let referenced = reachability::find_referenced(classes);
        self.transform_with(classes, &referenced)
    }

    fn transform_with(&self, classes: &ClassMap, referenced: &ReferencedSet<'_>) -> Result<OutputTiers> {
        let mut tiers = OutputTiers::new();
        info!("Transforming {} classes", classes.len());
        let mut transformer = ClassTransformer::new(classes, referenced, &self.config);
        for class in classes.values() {
            if let Some(node) = transformer.transform(class)? {
                tiers.add_stub(transform::entry_name(&node.name), ClassWriter::write(&node)?);
            }
        }

        info!("Transforming {} inaccessible classes", referenced.len());
        for class in referenced.classes() {
            if let Some(node) = transform::skeleton(class)? {
                tiers.add_skeleton(transform::entry_name(&node.name), ClassWriter::write(&node)?);
            }
        }

        if transformer.uses_restrictions() {
            let node = hidden_api::restriction_type();
            tiers.set_restriction_type(transform::entry_name(&node.name), ClassWriter::write(&node)?);
        }
        Ok(tiers)
    }

    pub fn write<W: Write + Seek>(&self, tiers: &OutputTiers, out: W) -> Result<PackageSummary> {
        ArchivePackager::new(&self.config).write(tiers, out)
    }

    pub fn run(&self, inputs: &[PathBuf], output: &Path) -> Result<ExtractSummary> {
        let classes = self.load(inputs)?;
        info!("Searching for referenced inaccessible classes");
        let referenced = reachability::find_referenced(&classes);
        let tiers = self.transform_with(&classes, &referenced)?;
        let package = self.write(&tiers, BufWriter::new(File::create(output)?))?;
        info!("Wrote {} entries to {}", package.entries(), output.display());
        Ok(ExtractSummary {
            classes: classes.len(),
            referenced: referenced.len(),
            package,
        })
    }
}
