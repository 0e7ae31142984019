//! Typed module documents
//!
//! A module bundles the runtime configuration that rides along with a card:
//! regex rewrite scripts applied to chat text plus an optional set of lore
//! entries. The packager serializes a module through the container codec and
//! stores the resulting blob as a single bundle entry.

use crate::error::Result;
use crate::manifest::LoreEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stage of the chat pipeline a regex script rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptTarget {
    /// User input before sending
    EditInput,
    /// Model output before display
    EditOutput,
    /// Stored chat history
    EditProcess,
    /// Display layer only
    EditDisplay,
}

/// One regex rewrite script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegexScript {
    pub comment: String,

    /// Pattern to match
    #[serde(rename = "in")]
    pub find: String,

    /// Replacement template
    #[serde(rename = "out")]
    pub replace: String,

    #[serde(rename = "type")]
    pub target: ScriptTarget,

    /// Whether `flag` overrides the default regex flags
    #[serde(rename = "ableFlag", default)]
    pub able_flag: bool,

    #[serde(rename = "flag", default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

impl RegexScript {
    pub fn new(
        comment: impl Into<String>,
        find: impl Into<String>,
        replace: impl Into<String>,
        target: ScriptTarget,
    ) -> Self {
        RegexScript {
            comment: comment.into(),
            find: find.into(),
            replace: replace.into(),
            target,
            able_flag: false,
            flags: None,
        }
    }

    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.able_flag = true;
        self.flags = Some(flags.into());
        self
    }
}

/// Module-level asset reference, serialized as a `[name, uri, ext]` triple
///
/// The uri element is blanked by the container codec on export; it is kept
/// in the model so an editing session can still resolve the asset locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAsset(pub String, pub String, pub String);

/// Module document fed to the container codec
///
/// The codec injects `id` at encode time when absent, so a freshly built
/// module may leave it `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,
    pub description: String,

    #[serde(default)]
    pub regex: Vec<RegexScript>,

    #[serde(default)]
    pub lorebook: Vec<LoreEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<ModuleAsset>,
}

impl ModuleDocument {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ModuleDocument {
            id: None,
            name: name.into(),
            description: description.into(),
            regex: Vec::new(),
            lorebook: Vec::new(),
            assets: Vec::new(),
        }
    }

    pub fn add_script(&mut self, script: RegexScript) {
        self.regex.push(script);
    }

    pub fn add_lore_entry(&mut self, entry: LoreEntry) {
        self.lorebook.push(entry);
    }

    /// JSON document form consumed by the container codec
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
