//! Module container codec
//!
//! Reversible mapping between a JSON module document plus an ordered list of
//! raw asset blobs and a single flat byte sequence.
//!
//! **Wire layout**:
//!
//! ```text
//! [magic: 0x6F][version: 0x00][main_len: u32 LE][main: compressed envelope]
//! ([marker: 0x01][asset_len: u32 LE][asset: compressed bytes])*
//! [marker: 0x00]
//! ```
//!
//! The main record is the UTF-8 JSON text of `{"type":"module","module":{…}}`
//! run through the configured [`Compressor`]. Asset records are compressed
//! independently. There is no per-record method byte; writer and reader must
//! use the same compression method.

use crate::compression::Compressor;
use crate::error::{CharxError, Result};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Container magic byte
pub const MAGIC: u8 = 0x6F;

/// Container format version (the only supported value)
pub const VERSION: u8 = 0x00;

/// Required `type` field of the main JSON envelope
pub const ENVELOPE_TYPE: &str = "module";

const ASSET_MARK: u8 = 0x01;
const END_MARK: u8 = 0x00;

/// Source of fresh document identifiers
///
/// Injected so tests can pin identifier generation and assert byte-identical
/// encoder output. Identifiers only need to be unique enough for bundle-local
/// disambiguation; they are not security tokens.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Default identifier source: random UUID v4
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Encoder/decoder for the module container format
pub struct ContainerCodec {
    compressor: Box<dyn Compressor>,
    ids: Box<dyn IdSource>,
}

impl ContainerCodec {
    /// Create a codec over the given compression primitive
    pub fn new(compressor: Box<dyn Compressor>) -> Self {
        ContainerCodec {
            compressor,
            ids: Box::new(RandomIds),
        }
    }

    /// Replace the identifier source (used by tests to pin ids)
    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Serialize a module document and its asset blobs into a container buffer
    ///
    /// The caller's document is never mutated. A copy is taken, an `id` is
    /// injected if the document is an object lacking one, and the path
    /// component of every entry under the document's `assets` key is blanked:
    /// bundle-internal paths are a storage detail of the archive layer, not
    /// container payload.
    pub fn encode(&self, document: &Value, assets: &[Vec<u8>]) -> Result<Vec<u8>> {
        let mut doc = document.clone();

        if let Value::Object(map) = &mut doc {
            if !map.contains_key("id") {
                map.insert("id".to_string(), Value::String(self.ids.next_id()));
            }
            if let Some(Value::Array(entries)) = map.get_mut("assets") {
                for entry in entries {
                    blank_asset_path(entry);
                }
            }
        }

        let envelope = serde_json::json!({
            "type": ENVELOPE_TYPE,
            "module": doc,
        });
        let text = serde_json::to_string_pretty(&envelope)?;
        let main = self.compressor.transform(text.as_bytes())?;

        let mut out = Vec::with_capacity(6 + main.len());
        out.push(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&record_len(main.len())?.to_le_bytes());
        out.extend_from_slice(&main);

        for asset in assets {
            let encoded = self.compressor.transform(asset)?;
            out.push(ASSET_MARK);
            out.extend_from_slice(&record_len(encoded.len())?.to_le_bytes());
            out.extend_from_slice(&encoded);
        }

        out.push(END_MARK);

        debug!(
            "encoded container: {} asset records, {} bytes total",
            assets.len(),
            out.len()
        );
        Ok(out)
    }

    /// Parse a container buffer back into its module document and asset blobs
    ///
    /// Fails with a format error on bad magic, unsupported version, a wrong
    /// envelope type, an unknown record marker, or any read past the end of
    /// the buffer. Bytes after the end marker are ignored.
    pub fn decode(&self, buffer: &[u8]) -> Result<(Value, Vec<Vec<u8>>)> {
        let mut cursor = ByteCursor::new(buffer);

        let magic = cursor.read_u8()?;
        if magic != MAGIC {
            return Err(CharxError::BadMagic(magic));
        }

        let version = cursor.read_u8()?;
        if version != VERSION {
            return Err(CharxError::UnsupportedVersion(version));
        }

        let main_len = cursor.read_u32_le()? as usize;
        let main = cursor.read_slice(main_len)?;
        let text = String::from_utf8(self.compressor.untransform(main)?)?;
        let envelope: Value = serde_json::from_str(&text)?;

        let envelope_type = envelope
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if envelope_type != ENVELOPE_TYPE {
            return Err(CharxError::InvalidEnvelopeType(envelope_type.to_string()));
        }
        let module = envelope.get("module").cloned().unwrap_or(Value::Null);

        let mut assets = Vec::new();
        loop {
            match cursor.read_u8()? {
                END_MARK => break,
                ASSET_MARK => {
                    let len = cursor.read_u32_le()? as usize;
                    let data = cursor.read_slice(len)?;
                    assets.push(self.compressor.untransform(data)?);
                }
                other => return Err(CharxError::InvalidAssetMarker(other)),
            }
        }

        debug!("decoded container: {} asset records", assets.len());
        Ok((module, assets))
    }
}

/// Blank the path component of one asset reference
///
/// Module documents carry assets either as `[name, uri, ext]` triples or as
/// objects with a `uri` field; both forms lose their path on export.
fn blank_asset_path(entry: &mut Value) {
    match entry {
        Value::Array(parts) => {
            if parts.len() >= 2 {
                parts[1] = Value::String(String::new());
            }
        }
        Value::Object(obj) => {
            if obj.contains_key("uri") {
                obj.insert("uri".to_string(), Value::String(String::new()));
            }
        }
        _ => {}
    }
}

fn record_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CharxError::OversizedPayload(len))
}

/// Bounds-checked reader over the container buffer
///
/// Every out-of-bounds read reports the offset at which the buffer ran out,
/// so truncation at any byte boundary surfaces as `Truncated` rather than a
/// wrong-but-plausible result.
struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or(CharxError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let slice = self.read_slice(4)?;
        Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CharxError::Truncated(self.pos))?;
        if end > self.buf.len() {
            return Err(CharxError::Truncated(self.pos));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}
