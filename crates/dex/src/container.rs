use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use apistub_model::{BoxError, ClassSource, SourceClass};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{DexError, Result};
use crate::file::{DEX_MAGIC, DexFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    RawDex,
    Zip,
}

/// An input archive holding one or more dex images: either a bare dex file or
/// a jar/apk whose entries are dex files.
#[derive(Debug, Clone)]
pub struct DexContainer {
    path: PathBuf,
    kind: ContainerKind,
}

impl DexContainer {
    /// Opens `path`, detecting the container kind from its magic bytes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(|_| {
            DexError::UnknownFormat(format!("{} is too short", path.display()))
        })?;

        let kind = match &magic {
            // PK\x03\x04, PK\x05\x06 (empty), PK\x07\x08 (spanned)
            [0x50, 0x4b, _, _] => ContainerKind::Zip,
            magic if magic == DEX_MAGIC => ContainerKind::RawDex,
            _ => return Err(DexError::UnknownFormat(path.display().to_string())),
        };
        Ok(Self {
            path: path.to_path_buf(),
            kind,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the dex images in the container, in archive order.
    pub fn entry_names(&self) -> Result<Vec<String>> {
        match self.kind {
            ContainerKind::RawDex => Ok(vec![self.raw_entry_name()]),
            ContainerKind::Zip => {
                let mut archive = ZipArchive::new(File::open(&self.path)?)?;
                let mut names = Vec::new();
                for i in 0..archive.len() {
                    let mut entry = archive.by_index(i)?;
                    if entry.is_dir() {
                        continue;
                    }
                    let mut magic = [0u8; 4];
                    if entry.read_exact(&mut magic).is_ok() && &magic == DEX_MAGIC {
                        names.push(entry.name().to_string());
                    }
                }
                Ok(names)
            }
        }
    }

    /// Parses every dex image in the container, in archive order.
    pub fn for_each_dex(&self, mut visit: impl FnMut(&str, DexFile) -> Result<()>) -> Result<()> {
        match self.kind {
            ContainerKind::RawDex => {
                let bytes = std::fs::read(&self.path)?;
                visit(&self.raw_entry_name(), DexFile::parse(bytes)?)
            }
            ContainerKind::Zip => {
                let names = self.entry_names()?;
                let mut archive = ZipArchive::new(File::open(&self.path)?)?;
                for name in names {
                    let mut entry = archive.by_name(&name)?;
                    let mut bytes = Vec::with_capacity(entry.size() as usize);
                    entry.read_to_end(&mut bytes)?;
                    drop(entry);
                    visit(&name, DexFile::parse(bytes)?)?;
                }
                Ok(())
            }
        }
    }

    fn raw_entry_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// [`ClassSource`] over dex containers, flattening every image of a
/// container into one class stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct DexLoader;

impl DexLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ClassSource for DexLoader {
    fn name(&self) -> &str {
        "dex"
    }

    fn can_load(&self, location: &Path) -> bool {
        DexContainer::open(location).is_ok()
    }

    fn for_each_class(
        &self,
        location: &Path,
        visit: &mut dyn FnMut(SourceClass),
    ) -> std::result::Result<(), BoxError> {
        let container = DexContainer::open(location)?;
        container.for_each_dex(|name, dex| {
            debug!(
                "Reading {} ({} classes, version {:03})",
                name,
                dex.class_count(),
                dex.version()
            );
            dex.for_each_class(&mut *visit)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::testing::{ClassSpec, DexBuilder};

    fn dex_with(type_names: &[&str]) -> Vec<u8> {
        let mut builder = DexBuilder::new();
        for type_name in type_names {
            builder.class(
                type_name,
                ClassSpec {
                    access_flags: 0x0001,
                    superclass: Some("Ljava/lang/Object;".into()),
                    ..Default::default()
                },
            );
        }
        builder.build()
    }

    fn collect(location: &Path) -> Vec<String> {
        let mut names = Vec::new();
        DexLoader::new()
            .for_each_class(location, &mut |class| names.push(class.type_name))
            .unwrap();
        names
    }

    #[test]
    fn test_raw_dex() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.dex");
        std::fs::write(&path, dex_with(&["Lpkg/A;", "Lpkg/B;"])).unwrap();

        let container = DexContainer::open(&path).unwrap();
        assert_eq!(container.entry_names().unwrap(), vec!["core.dex".to_string()]);
        assert_eq!(collect(&path), vec!["Lpkg/A;", "Lpkg/B;"]);
    }

    #[test]
    fn test_multidex_archive_is_flattened() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("framework.jar");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        zip.start_file("classes.dex", options).unwrap();
        zip.write_all(&dex_with(&["Lpkg/A;"])).unwrap();
        zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
        zip.write_all(b"Manifest-Version: 1.0\n").unwrap();
        zip.start_file("classes2.dex", options).unwrap();
        zip.write_all(&dex_with(&["Lpkg/B;", "Lpkg/C;"])).unwrap();
        zip.finish().unwrap();

        let container = DexContainer::open(&path).unwrap();
        assert_eq!(
            container.entry_names().unwrap(),
            vec!["classes.dex".to_string(), "classes2.dex".to_string()]
        );
        assert!(DexLoader::new().can_load(&path));
        assert_eq!(collect(&path), vec!["Lpkg/A;", "Lpkg/B;", "Lpkg/C;"]);
    }

    #[test]
    fn test_unknown_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not an archive").unwrap();

        assert!(matches!(
            DexContainer::open(&path),
            Err(DexError::UnknownFormat(_))
        ));
        assert!(!DexLoader::new().can_load(&path));
    }
}
