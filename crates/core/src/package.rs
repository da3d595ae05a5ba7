//! Deterministic archive assembly.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, Write};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::config::ExtractorConfig;
use crate::error::Result;

/// Class files produced by the transformers, keyed by entry name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OutputTiers {
    stubs: BTreeMap<String, Vec<u8>>,
    skeletons: BTreeMap<String, Vec<u8>>,
    restriction_type: Option<(String, Vec<u8>)>,
}

impl OutputTiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stub(&mut self, name: String, bytes: Vec<u8>) {
        if self.stubs.insert(name.clone(), bytes).is_some() {
            warn!("Duplicated class: {}", name);
        }
    }

    /// A skeleton replaces a public stub of the same name.
    pub fn add_skeleton(&mut self, name: String, bytes: Vec<u8>) {
        if self.stubs.remove(&name).is_some() {
            warn!("Duplicated class across tiers: {}", name);
        }
        if self.skeletons.insert(name.clone(), bytes).is_some() {
            warn!("Duplicated inaccessible class: {}", name);
        }
    }

    pub fn set_restriction_type(&mut self, name: String, bytes: Vec<u8>) {
        self.restriction_type = Some((name, bytes));
    }

    pub fn stubs(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.stubs
    }

    pub fn skeletons(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.skeletons
    }

    pub fn has_restriction_type(&self) -> bool {
        self.restriction_type.is_some()
    }

    /// Every class entry in archive order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.stubs
            .iter()
            .chain(self.skeletons.iter())
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
            .chain(
                self.restriction_type
                    .iter()
                    .map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
            )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PackageSummary {
    pub stubs: usize,
    pub skeletons: usize,
    pub restriction_type: bool,
    pub resources: usize,
}

impl PackageSummary {
    pub fn entries(&self) -> usize {
        self.stubs + self.skeletons + usize::from(self.restriction_type) + self.resources
    }
}

pub struct ArchivePackager<'a> {
    config: &'a ExtractorConfig,
}

impl<'a> ArchivePackager<'a> {
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.config.compression_level))
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644)
    }

    /// Writes the class tiers, then the spliced resources, to `out`.
    pub fn write<W: Write + Seek>(&self, tiers: &OutputTiers, out: W) -> Result<PackageSummary> {
        let mut zip = ZipWriter::new(out);
        let options = self.options();

        info!("Writing {} classes", tiers.stubs.len());
        for (name, bytes) in &tiers.stubs {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        info!("Writing {} inaccessible classes", tiers.skeletons.len());
        for (name, bytes) in &tiers.skeletons {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        if let Some((name, bytes)) = &tiers.restriction_type {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        let resources = if self.config.splices_resources() {
            self.splice_resources(&mut zip)?
        } else {
            0
        };
        zip.finish()?.flush()?;

        Ok(PackageSummary {
            stubs: tiers.stubs.len(),
            skeletons: tiers.skeletons.len(),
            restriction_type: tiers.restriction_type.is_some(),
            resources,
        })
    }

    /// Copies matching entries of the resource archive in its own order,
    /// keeping each entry's compression method.
    fn splice_resources<W: Write + Seek>(&self, zip: &mut ZipWriter<W>) -> Result<usize> {
        info!("Writing resources from {}", self.config.resource_archive.display());
        let mut archive = ZipArchive::new(File::open(&self.config.resource_archive)?)?;
        let mut copied = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if entry.is_dir() || !self.config.is_spliced_resource(&name) {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;

            let mut options = self.options();
            if entry.compression() == CompressionMethod::Stored {
                options = options
                    .compression_method(CompressionMethod::Stored)
                    .compression_level(None);
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&bytes)?;
            copied += 1;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            append_resource_blocks: false,
            append_resource_files: false,
            ..Default::default()
        }
    }

    fn names<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<String> {
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_tiers_are_sorted_and_ordered() {
        let mut tiers = OutputTiers::new();
        tiers.add_stub("pkg/Widget.class".into(), vec![1]);
        tiers.add_stub("a/Api.class".into(), vec![2]);
        tiers.add_skeleton("pkg/Base.class".into(), vec![3]);
        tiers.add_skeleton("a/Hidden.class".into(), vec![4]);
        tiers.set_restriction_type("android/annotation/HiddenApiRestriction.class".into(), vec![5]);

        let config = config();
        let mut out = Cursor::new(Vec::new());
        let summary = ArchivePackager::new(&config).write(&tiers, &mut out).unwrap();
        assert_eq!(summary.entries(), 5);

        let mut archive = ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        assert_eq!(
            names(&mut archive),
            vec![
                "a/Api.class",
                "pkg/Widget.class",
                "a/Hidden.class",
                "pkg/Base.class",
                "android/annotation/HiddenApiRestriction.class",
            ]
        );
    }

    #[test]
    fn test_collisions_last_write_wins() {
        let mut tiers = OutputTiers::new();
        tiers.add_stub("pkg/A.class".into(), vec![1]);
        tiers.add_stub("pkg/A.class".into(), vec![2]);
        assert_eq!(tiers.stubs()["pkg/A.class"], vec![2]);

        tiers.add_skeleton("pkg/A.class".into(), vec![3]);
        assert!(tiers.stubs().is_empty());
        assert_eq!(tiers.skeletons()["pkg/A.class"], vec![3]);
        assert_eq!(tiers.entries().count(), 1);
    }

    #[test]
    fn test_resources_are_spliced_after_classes() {
        let dir = tempfile::TempDir::new().unwrap();
        let resource_archive = dir.path().join("framework-res.apk");
        {
            let mut zip = ZipWriter::new(File::create(&resource_archive).unwrap());
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("AndroidManifest.xml", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"<manifest/>").unwrap();
            zip.start_file("classes.dex", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"dex\n035\0").unwrap();
            zip.start_file("resources.arsc", stored).unwrap();
            zip.write_all(&[0x02, 0x00, 0x0c, 0x00]).unwrap();
            zip.start_file("res/layout/main.xml", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"<LinearLayout/>").unwrap();
            zip.finish().unwrap();
        }

        let config = ExtractorConfig {
            resource_archive,
            ..Default::default()
        };
        let mut tiers = OutputTiers::new();
        tiers.add_stub("pkg/A.class".into(), vec![0xca, 0xfe]);
        let mut out = Cursor::new(Vec::new());
        let summary = ArchivePackager::new(&config).write(&tiers, &mut out).unwrap();
        assert_eq!(summary.resources, 3);

        let mut archive = ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        assert_eq!(
            names(&mut archive),
            vec!["pkg/A.class", "AndroidManifest.xml", "resources.arsc", "res/layout/main.xml"]
        );
        let mut arsc = archive.by_name("resources.arsc").unwrap();
        assert_eq!(arsc.compression(), CompressionMethod::Stored);
        let mut bytes = Vec::new();
        arsc.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x02, 0x00, 0x0c, 0x00]);
    }

    #[test]
    fn test_missing_resource_archive_is_fatal() {
        let config = ExtractorConfig {
            resource_archive: "/nonexistent/framework-res.apk".into(),
            ..Default::default()
        };
        let mut out = Cursor::new(Vec::new());
        assert!(ArchivePackager::new(&config)
            .write(&OutputTiers::new(), &mut out)
            .is_err());
    }
}
