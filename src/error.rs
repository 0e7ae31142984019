use thiserror::Error;

#[derive(Error, Debug)]
pub enum CharxError {
    // --- container format errors (always fatal to the decode call) ---
    #[error("bad magic byte: {0:#04x}")]
    BadMagic(u8),

    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u8),

    #[error("truncated container at offset {0}")]
    Truncated(usize),

    #[error("invalid envelope type: {0:?}")]
    InvalidEnvelopeType(String),

    #[error("invalid asset marker: {0:#04x}")]
    InvalidAssetMarker(u8),

    // --- encoding errors (input not serializable, caller must fix input) ---
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("payload of {0} bytes exceeds the u32 length prefix")]
    OversizedPayload(usize),

    #[error("container payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // --- compression errors ---
    #[error("compression primitive not initialized")]
    CompressionUnavailable,

    #[error("compression failed: {0}")]
    Compression(String),

    // --- packaging errors ---
    #[error("dangling asset reference: {0}")]
    DanglingAssetRef(String),

    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("invalid asset name: {0:?}")]
    InvalidAssetName(String),

    #[error("manifest validation failed: {0}")]
    InvalidManifest(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CharxError {
    /// True for malformed/truncated/unsupported-version container errors.
    ///
    /// Format errors describe a data problem in the buffer being decoded,
    /// as opposed to environment problems (`CompressionUnavailable`) or
    /// caller-input problems (`Serialization`).
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            CharxError::BadMagic(_)
                | CharxError::UnsupportedVersion(_)
                | CharxError::Truncated(_)
                | CharxError::InvalidEnvelopeType(_)
                | CharxError::InvalidAssetMarker(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CharxError>;
