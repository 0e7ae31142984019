//! Card bundle assembly
//!
//! [`CharxBuilder`] collects a manifest snapshot, binary asset blobs, text
//! files, and an optional module container blob, then renders a single ZIP
//! bundle. Entry layout:
//!
//! ```text
//! card.json                       canonical manifest document
//! assets/icon/image/icon.<ext>    primary image, if present
//! assets/other/image/<name>.<ext> named assets
//! module.cmod                     optional container blob
//! ```
//!
//! Output is deterministic for identical inputs and registration order:
//! entry timestamps are fixed and no per-run metadata is written.
//!
//! **Invariant**: every `embedded://` locator in the manifest must have an
//! entry written at exactly that path. `finalize` checks this before writing
//! anything and fails fast on a dangling reference.

use crate::container::ContainerCodec;
use crate::error::{CharxError, Result};
use crate::manifest::{AssetKind, AssetRef, CharacterManifest, ImageFormat};
use serde_json::Value;
use std::io::{Cursor, Write};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Fixed top-level path of the manifest document
pub const MANIFEST_PATH: &str = "card.json";

/// Fixed top-level path of the optional module container blob
pub const MODULE_PATH: &str = "module.cmod";

/// Directory for the primary image
pub const ICON_DIR: &str = "assets/icon/image";

/// Directory for named assets
pub const NAMED_ASSET_DIR: &str = "assets/other/image";

/// Bundle builder
///
/// Owns its manifest snapshot; callers hand the manifest over by value at
/// construction and the builder never mutates anything the caller retains.
pub struct CharxBuilder {
    manifest: CharacterManifest,
    asset_files: Vec<(String, Vec<u8>)>,
    text_files: Vec<(String, String)>,
    module_blob: Option<Vec<u8>>,
    warnings: Vec<String>,
}

impl CharxBuilder {
    pub fn new(manifest: CharacterManifest) -> Self {
        CharxBuilder {
            manifest,
            asset_files: Vec::new(),
            text_files: Vec::new(),
            module_blob: None,
            warnings: Vec::new(),
        }
    }

    pub fn manifest(&self) -> &CharacterManifest {
        &self.manifest
    }

    /// Register the primary image at `assets/icon/image/icon.<ext>` and
    /// append the matching asset reference to the manifest
    pub fn add_primary_image(&mut self, bytes: Vec<u8>, format: ImageFormat) -> Result<()> {
        let path = format!("{}/icon.{}", ICON_DIR, format.as_str());
        self.register_asset(path.clone(), bytes)?;
        self.manifest
            .add_asset(AssetRef::embedded(AssetKind::Icon, path, "main", format));
        Ok(())
    }

    /// Register a named asset at `assets/other/image/<name>.<ext>`
    pub fn add_named_asset(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
        format: ImageFormat,
    ) -> Result<()> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(CharxError::InvalidAssetName(name.to_string()));
        }
        let file_name = format!("{}.{}", name, format.as_str());
        let path = format!("{}/{}", NAMED_ASSET_DIR, file_name);
        self.register_asset(path.clone(), bytes)?;
        self.manifest.add_asset(AssetRef::embedded(
            AssetKind::Embedded,
            path,
            file_name,
            format,
        ));
        Ok(())
    }

    /// Register a top-level text file
    pub fn add_text_file(&mut self, name: &str, content: impl Into<String>) -> Result<()> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(CharxError::InvalidAssetName(name.to_string()));
        }
        self.ensure_unique(name)?;
        self.text_files.push((name.to_string(), content.into()));
        Ok(())
    }

    /// Encode a module document and stage the blob at `module.cmod`
    ///
    /// The sole recoverable failure in packaging: when encoding fails (for
    /// example because the compression primitive is not initialized) the
    /// bundle is still produced without the module blob and the omission is
    /// recorded as a warning.
    pub fn attach_module(&mut self, codec: &ContainerCodec, module: &Value) {
        match codec.encode(module, &[]) {
            Ok(blob) => self.module_blob = Some(blob),
            Err(e) => {
                warn!("module blob omitted from bundle: {}", e);
                self.warnings.push(format!("module blob omitted: {}", e));
            }
        }
    }

    /// Non-fatal problems recorded while building
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Render the bundle
    ///
    /// Validates the manifest, checks every embedded asset reference against
    /// the registered entries, then writes the manifest, assets, text files,
    /// and module blob in registration order.
    pub fn finalize(self) -> Result<Vec<u8>> {
        let document = self.manifest.to_canonical_document()?;

        for asset in &self.manifest.assets {
            if let Some(path) = asset.embedded_path() {
                if !self.has_entry(path) {
                    return Err(CharxError::DanglingAssetRef(path.to_string()));
                }
            }
        }

        // Fixed timestamp (zip epoch) keeps output byte-stable across runs
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6))
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file(MANIFEST_PATH, options)?;
        zip.write_all(&render_card_json(&document)?)?;

        for (path, bytes) in &self.asset_files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        for (path, content) in &self.text_files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(content.as_bytes())?;
        }

        if let Some(blob) = &self.module_blob {
            zip.start_file(MODULE_PATH, options)?;
            zip.write_all(blob)?;
        }

        let cursor = zip.finish()?;
        let bytes = cursor.into_inner();
        debug!(
            "finalized bundle: {} asset entries, {} text entries, module blob: {}, {} bytes",
            self.asset_files.len(),
            self.text_files.len(),
            self.module_blob.is_some(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn register_asset(&mut self, path: String, bytes: Vec<u8>) -> Result<()> {
        self.ensure_unique(&path)?;
        self.asset_files.push((path, bytes));
        Ok(())
    }

    fn ensure_unique(&self, path: &str) -> Result<()> {
        if path == MANIFEST_PATH || path == MODULE_PATH || self.has_entry(path) {
            return Err(CharxError::DuplicateEntry(path.to_string()));
        }
        Ok(())
    }

    fn has_entry(&self, path: &str) -> bool {
        self.asset_files.iter().any(|(p, _)| p == path)
            || self.text_files.iter().any(|(p, _)| p == path)
    }
}

/// Serialize the card document with 4-space indentation
fn render_card_json(document: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(document, &mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::CharacterManifest;

    fn manifest() -> CharacterManifest {
        CharacterManifest::new("Aria", "A knight.", "Hello.")
    }

    #[test]
    fn test_primary_image_path_and_ref() {
        let mut builder = CharxBuilder::new(manifest());
        builder
            .add_primary_image(vec![0x89, 0x50, 0x4E], ImageFormat::Png)
            .unwrap();

        let asset = &builder.manifest().assets[0];
        assert_eq!(asset.kind, AssetKind::Icon);
        assert_eq!(asset.locator, "embedded://assets/icon/image/icon.png");
        assert_eq!(asset.display_name, "main");
    }

    #[test]
    fn test_named_asset_path_and_ref() {
        let mut builder = CharxBuilder::new(manifest());
        builder
            .add_named_asset("smile", vec![1, 2, 3], ImageFormat::Webp)
            .unwrap();

        let asset = &builder.manifest().assets[0];
        assert_eq!(asset.kind, AssetKind::Embedded);
        assert_eq!(asset.locator, "embedded://assets/other/image/smile.webp");
        assert_eq!(asset.display_name, "smile.webp");
    }

    #[test]
    fn test_rejects_path_separators_in_names() {
        let mut builder = CharxBuilder::new(manifest());
        assert!(matches!(
            builder.add_named_asset("a/b", vec![], ImageFormat::Png),
            Err(CharxError::InvalidAssetName(_))
        ));
        assert!(matches!(
            builder.add_text_file("..\\escape", "x"),
            Err(CharxError::InvalidAssetName(_))
        ));
        assert!(matches!(
            builder.add_named_asset("", vec![], ImageFormat::Png),
            Err(CharxError::InvalidAssetName(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = CharxBuilder::new(manifest());
        builder
            .add_named_asset("smile", vec![1], ImageFormat::Png)
            .unwrap();
        assert!(matches!(
            builder.add_named_asset("smile", vec![2], ImageFormat::Png),
            Err(CharxError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn test_reserved_paths_rejected() {
        let mut builder = CharxBuilder::new(manifest());
        assert!(matches!(
            builder.add_text_file(MANIFEST_PATH, "{}"),
            Err(CharxError::DuplicateEntry(_))
        ));
        assert!(matches!(
            builder.add_text_file(MODULE_PATH, ""),
            Err(CharxError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn test_card_json_indentation() {
        let doc = serde_json::json!({"a": {"b": 1}});
        let text = String::from_utf8(render_card_json(&doc).unwrap()).unwrap();
        assert!(text.contains("\n    \"a\""));
        assert!(text.contains("\n        \"b\""));
    }
}
