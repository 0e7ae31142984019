//! Charx Card Archive Format
//!
//! Packs a character-card bundle — a canonical JSON manifest plus binary
//! image assets — into a single distributable `.charx` archive, with an
//! embedded, versioned, length-prefixed "module" container for runtime
//! configuration (regex scripts and lore).
//!
//! ## Layers
//!
//! - [`manifest`] - In-memory card metadata with invariant-preserving
//!   mutation operations and Character Card V3 canonicalization
//! - [`container`] - Module container codec (magic/version header,
//!   little-endian length-prefixed records, pluggable compression)
//! - [`packager`] - ZIP bundle assembly with a fixed path layout and
//!   a dangling-reference consistency check
//! - [`compression`] - Reversible byte transforms (LZ4, Zstd) behind the
//!   [`compression::Compressor`] trait, with a gated one-time init wrapper
//! - [`module`] - Typed module documents (regex scripts + lore)
//! - [`llm`] - Interface-only contract for the external text-generation
//!   collaborator
//!
//! ## Container layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ magic 0x6F │ version 0x00                   │
//! ├─────────────────────────────────────────────┤
//! │ main length (u32 LE)                        │
//! │ compressed {"type":"module","module":{…}}   │
//! ├─────────────────────────────────────────────┤
//! │ marker 0x01 │ length │ compressed asset     │  (repeated)
//! ├─────────────────────────────────────────────┤
//! │ marker 0x00 (end)                           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use charx::compression::Lz4Codec;
//! use charx::container::ContainerCodec;
//! use charx::manifest::{CharacterManifest, ImageFormat};
//! use charx::module::ModuleDocument;
//! use charx::packager::CharxBuilder;
//!
//! let manifest = CharacterManifest::new("Aria", "A knight.", "Hello.");
//! let mut builder = CharxBuilder::new(manifest);
//! builder
//!     .add_primary_image(vec![0x89, 0x50, 0x4E], ImageFormat::Png)
//!     .unwrap();
//!
//! let codec = ContainerCodec::new(Box::new(Lz4Codec));
//! let module = ModuleDocument::new("Aria Module", "Runtime scripts");
//! builder.attach_module(&codec, &module.to_document().unwrap());
//!
//! let bundle = builder.finalize().unwrap();
//! assert!(!bundle.is_empty());
//! ```

pub mod compression;
pub mod container;
pub mod error;
pub mod llm;
pub mod manifest;
pub mod module;
pub mod packager;

// Re-export commonly used types
pub use compression::{CompressionMethod, Compressor, GatedCompressor, Lz4Codec, ZstdCodec};
pub use container::{ContainerCodec, IdSource, RandomIds};
pub use error::{CharxError, Result};
pub use manifest::{
    AssetKind, AssetRef, CharacterManifest, ImageFormat, LoreBook, LoreEntry, LoreMode,
};
pub use module::{ModuleDocument, RegexScript, ScriptTarget};
pub use packager::{CharxBuilder, MANIFEST_PATH, MODULE_PATH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Container format magic byte
pub const MAGIC: u8 = container::MAGIC;
