//! Character manifest model
//!
//! In-memory representation of a card's structured metadata: profile fields,
//! asset references, and embedded lore entries. Mutation operations are
//! exposed as discrete calls because the surrounding editing workflow makes
//! many small incremental edits; the canonical JSON document is produced once
//! at export time via [`CharacterManifest::to_canonical_document`].
//!
//! The canonical document uses Character Card V3 key names (`first_mes`,
//! `character_book`, `insertion_order`, …) with the payload under `data`.

use crate::error::{CharxError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// URI scheme marking bundle-internal assets
pub const EMBEDDED_SCHEME: &str = "embedded://";

/// `spec` field of the canonical card document
pub const CARD_SPEC: &str = "chara_card_v3";

/// `spec_version` field of the canonical card document
pub const CARD_SPEC_VERSION: &str = "3.0";

/// Role of an embedded or external binary resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Primary character icon
    Icon,
    /// Inline emotion sprite
    Emotion,
    /// Chat background
    Background,
    /// User-side icon
    UserIcon,
    /// Generic embedded asset
    Embedded,
}

/// Image container format, detected from magic bytes where possible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
    Webp,
    Gif,
    Avif,
}

impl ImageFormat {
    /// Lowercase file extension for this format
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Avif => "avif",
        }
    }

    /// Detect the format from leading magic bytes, defaulting to PNG
    pub fn sniff(data: &[u8]) -> ImageFormat {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            ImageFormat::Png
        } else if data.starts_with(&[0xFF, 0xD8]) {
            ImageFormat::Jpg
        } else if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else if data.starts_with(b"GIF") {
            ImageFormat::Gif
        } else if data.len() >= 12 && &data[4..12] == b"ftypavif" {
            ImageFormat::Avif
        } else {
            ImageFormat::Png
        }
    }
}

/// Manifest-level pointer to a binary resource
///
/// For embedded assets the locator is `embedded://<path>` where `<path>` is
/// exactly the entry path inside the bundle; the packager keeps the two in
/// lockstep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "type")]
    pub kind: AssetKind,

    #[serde(rename = "uri")]
    pub locator: String,

    #[serde(rename = "name")]
    pub display_name: String,

    #[serde(rename = "ext")]
    pub extension: ImageFormat,
}

impl AssetRef {
    /// Reference to an asset stored inside the bundle at `path`
    pub fn embedded(
        kind: AssetKind,
        path: impl Into<String>,
        display_name: impl Into<String>,
        extension: ImageFormat,
    ) -> Self {
        AssetRef {
            kind,
            locator: format!("{}{}", EMBEDDED_SCHEME, path.into()),
            display_name: display_name.into(),
            extension,
        }
    }

    /// Reference to an asset at an external URL
    pub fn external(
        kind: AssetKind,
        url: impl Into<String>,
        display_name: impl Into<String>,
        extension: ImageFormat,
    ) -> Self {
        AssetRef {
            kind,
            locator: url.into(),
            display_name: display_name.into(),
            extension,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.locator.starts_with(EMBEDDED_SCHEME)
    }

    /// Bundle-internal path for embedded assets
    pub fn embedded_path(&self) -> Option<&str> {
        self.locator.strip_prefix(EMBEDDED_SCHEME)
    }
}

/// Activation mode of a lore entry
///
/// `Constant` iff the entry is always active; the coupling is maintained by
/// [`LoreEntry::set_always_active`], the only way to change either field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoreMode {
    #[default]
    Normal,
    Constant,
}

/// One piece of conditionally-injected world/character knowledge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoreEntry {
    pub keys: Vec<String>,
    pub content: String,
    pub enabled: bool,
    pub insertion_order: i32,
    pub case_sensitive: bool,
    pub name: String,
    #[serde(rename = "constant")]
    always_active: bool,
    mode: LoreMode,
}

impl LoreEntry {
    pub fn new(keys: Vec<String>, content: impl Into<String>) -> Self {
        LoreEntry {
            keys,
            content: content.into(),
            enabled: true,
            insertion_order: 100,
            case_sensitive: false,
            name: String::new(),
            always_active: false,
            mode: LoreMode::Normal,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_always_active(mut self, always_active: bool) -> Self {
        self.set_always_active(always_active);
        self
    }

    /// Set the always-active flag, forcing `mode` in the same operation
    pub fn set_always_active(&mut self, always_active: bool) {
        self.always_active = always_active;
        self.mode = if always_active {
            LoreMode::Constant
        } else {
            LoreMode::Normal
        };
    }

    pub fn always_active(&self) -> bool {
        self.always_active
    }

    pub fn mode(&self) -> LoreMode {
        self.mode
    }
}

// Deserialization repairs inconsistent input: the `constant` flag wins and
// `mode` is recomputed, so the invariant holds for documents from any source.
impl<'de> Deserialize<'de> for LoreEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            keys: Vec<String>,
            #[serde(default)]
            content: String,
            #[serde(default = "default_enabled")]
            enabled: bool,
            #[serde(default = "default_insertion_order")]
            insertion_order: i32,
            #[serde(default)]
            case_sensitive: bool,
            #[serde(default)]
            name: String,
            #[serde(default)]
            constant: bool,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut entry = LoreEntry::new(raw.keys, raw.content);
        entry.enabled = raw.enabled;
        entry.insertion_order = raw.insertion_order;
        entry.case_sensitive = raw.case_sensitive;
        entry.name = raw.name;
        entry.set_always_active(raw.constant);
        Ok(entry)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_insertion_order() -> i32 {
    100
}

/// Grouped lore entries with scan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreBook {
    pub scan_depth: u32,
    pub token_budget: u32,
    pub recursive_scanning: bool,
    pub entries: Vec<LoreEntry>,
}

impl Default for LoreBook {
    fn default() -> Self {
        LoreBook {
            scan_depth: 5,
            token_budget: 30000,
            recursive_scanning: false,
            entries: Vec::new(),
        }
    }
}

/// Root card document
///
/// Constructed once per export, mutated through the operations below, and
/// handed by value to the packager. Components downstream treat it as a
/// read-only snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterManifest {
    pub name: String,
    pub description: String,

    #[serde(rename = "first_mes")]
    pub first_message: String,

    #[serde(default)]
    pub personality: String,

    #[serde(default)]
    pub scenario: String,

    #[serde(rename = "mes_example", default)]
    pub message_example: String,

    #[serde(default)]
    pub system_prompt: String,

    #[serde(default)]
    pub post_history_instructions: String,

    #[serde(default)]
    pub alternate_greetings: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub creator: String,

    #[serde(default = "default_character_version")]
    pub character_version: String,

    #[serde(default)]
    pub creator_notes: String,

    #[serde(default)]
    pub assets: Vec<AssetRef>,

    #[serde(rename = "character_book", default, skip_serializing_if = "Option::is_none")]
    pub lore: Option<LoreBook>,

    #[serde(default)]
    pub extensions: serde_json::Map<String, Value>,
}

fn default_character_version() -> String {
    "1.0".to_string()
}

impl CharacterManifest {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        first_message: impl Into<String>,
    ) -> Self {
        CharacterManifest {
            name: name.into(),
            description: description.into(),
            first_message: first_message.into(),
            personality: String::new(),
            scenario: String::new(),
            message_example: String::new(),
            system_prompt: String::new(),
            post_history_instructions: String::new(),
            alternate_greetings: Vec::new(),
            tags: Vec::new(),
            creator: String::new(),
            character_version: default_character_version(),
            creator_notes: String::new(),
            assets: Vec::new(),
            lore: None,
            extensions: serde_json::Map::new(),
        }
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CharxError::InvalidManifest(
                "name must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn add_asset(&mut self, asset: AssetRef) {
        self.assets.push(asset);
    }

    /// Remove the first asset whose locator matches, returning it
    pub fn remove_asset(&mut self, locator: &str) -> Option<AssetRef> {
        let idx = self.assets.iter().position(|a| a.locator == locator)?;
        Some(self.assets.remove(idx))
    }

    /// Append a lore entry, creating the book with default scan settings
    /// when none exists yet
    pub fn add_lore_entry(&mut self, entry: LoreEntry) {
        self.lore.get_or_insert_with(LoreBook::default).entries.push(entry);
    }

    pub fn remove_lore_entry(&mut self, index: usize) -> Option<LoreEntry> {
        let book = self.lore.as_mut()?;
        if index >= book.entries.len() {
            return None;
        }
        Some(book.entries.remove(index))
    }

    /// Edit a lore entry in place; returns false when the index is absent
    pub fn edit_lore_entry(&mut self, index: usize, edit: impl FnOnce(&mut LoreEntry)) -> bool {
        match self.lore.as_mut().and_then(|book| book.entries.get_mut(index)) {
            Some(entry) => {
                edit(entry);
                true
            }
            None => false,
        }
    }

    pub fn set_post_history_instructions(&mut self, instructions: impl Into<String>) {
        self.post_history_instructions = instructions.into();
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Render the Character Card V3 document consumed by the packager
    ///
    /// Unknown extension keys pass through verbatim; `alternate_greetings`
    /// and `assets` are present even when empty.
    pub fn to_canonical_document(&self) -> Result<Value> {
        self.validate()?;
        Ok(serde_json::json!({
            "spec": CARD_SPEC,
            "spec_version": CARD_SPEC_VERSION,
            "data": serde_json::to_value(self)?,
        }))
    }
}
