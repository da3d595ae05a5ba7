use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable holding the device boot class path.
pub const BOOTCLASSPATH_VAR: &str = "BOOTCLASSPATH";

pub const DEFAULT_RESOURCE_ARCHIVE: &str = "/system/framework/framework-res.apk";
pub const DEFAULT_RESOURCE_ID_NAMESPACE: &str = "Lcom/android/internal/R$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Append a `<clinit>` that throws `RuntimeException("Stub!")` to every
    /// public stub.
    pub stub_initializer: bool,
    /// Annotate restricted members and emit the restriction annotation type.
    pub hidden_api_annotations: bool,
    /// Splice `AndroidManifest.xml` and `resources.arsc` from the resource
    /// archive.
    pub append_resource_blocks: bool,
    /// Splice everything under `assets/` and `res/` from the resource archive.
    pub append_resource_files: bool,
    pub resource_archive: PathBuf,
    /// Fields of classes under this type prefix never keep constant values.
    pub resource_id_namespace: String,
    pub compression_level: i64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            stub_initializer: true,
            hidden_api_annotations: true,
            append_resource_blocks: true,
            append_resource_files: true,
            resource_archive: PathBuf::from(DEFAULT_RESOURCE_ARCHIVE),
            resource_id_namespace: DEFAULT_RESOURCE_ID_NAMESPACE.to_string(),
            compression_level: 9,
        }
    }
}

impl ExtractorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn splices_resources(&self) -> bool {
        self.append_resource_blocks || self.append_resource_files
    }

    /// Whether an entry of the resource archive is copied into the output.
    pub fn is_spliced_resource(&self, name: &str) -> bool {
        (self.append_resource_blocks && (name == "resources.arsc" || name == "AndroidManifest.xml"))
            || (self.append_resource_files && (name.starts_with("assets/") || name.starts_with("res/")))
    }
}

/// Splits a colon-separated boot class path into merge order.
///
/// The list is reversed so that, under first-occurrence-wins merging, the
/// last boot archive takes precedence.
pub fn parse_bootclasspath(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|entry| !entry.is_empty())
        .rev()
        .map(PathBuf::from)
        .collect()
}

pub fn bootclasspath_from_env() -> Option<Vec<PathBuf>> {
    std::env::var(BOOTCLASSPATH_VAR)
        .ok()
        .map(|value| parse_bootclasspath(&value))
        .filter(|paths| !paths.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apistub.json");
        std::fs::write(
            &path,
            r#"{ "stub_initializer": false, "resource_archive": "/tmp/res.apk" }"#,
        )
        .unwrap();

        let config = ExtractorConfig::load(&path).unwrap();
        assert!(!config.stub_initializer);
        assert_eq!(config.resource_archive, PathBuf::from("/tmp/res.apk"));
        assert!(config.hidden_api_annotations);
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.resource_id_namespace, DEFAULT_RESOURCE_ID_NAMESPACE);
    }

    #[test]
    fn test_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apistub.json");
        std::fs::write(&path, "{ stub_initializer: ").unwrap();
        assert!(matches!(
            ExtractorConfig::load(&path),
            Err(crate::error::ExtractError::Config(_))
        ));
    }

    #[test]
    fn test_bootclasspath_is_reversed() {
        let paths = parse_bootclasspath("/apex/core-oj.jar:/system/framework/framework.jar::");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/system/framework/framework.jar"),
                PathBuf::from("/apex/core-oj.jar"),
            ]
        );
    }

    #[test]
    fn test_spliced_resource_patterns() {
        let mut config = ExtractorConfig::default();
        assert!(config.is_spliced_resource("resources.arsc"));
        assert!(config.is_spliced_resource("res/drawable/icon.png"));
        assert!(!config.is_spliced_resource("classes.dex"));
        assert!(!config.is_spliced_resource("META-INF/MANIFEST.MF"));

        config.append_resource_files = false;
        assert!(!config.is_spliced_resource("assets/fonts.xml"));
        assert!(config.is_spliced_resource("AndroidManifest.xml"));
    }
}
