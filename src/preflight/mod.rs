// Asset preflight: decides whether a local file is fit for upload before
// any request is made. The stages run in a fixed order and the first
// failure wins:
//
//   1. size guard (empty / larger than `MAX_ASSET_LEN`)
//   2. encoding sniffer (`encoding`)
//   3. format classifier (`format`)
//   4. structural validator / transcoder (`structure`)
//
// The caller's buffer is never modified. YAML and RAML assets come back
// with their JSON transcoding in `Preflight::transcoded`; the caller keeps
// uploading the original bytes.

pub mod encoding;
pub mod format;
pub mod structure;

use thiserror::Error;
use tracing::debug;

pub use encoding::ByteOrderMark;
pub use format::AssetFormat;

/// Largest asset accepted for upload, in bytes.
pub const MAX_ASSET_LEN: usize = 20_000;

/// Reasons an asset is refused. None of them are worth retrying: they all
/// describe the local file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightError {
    #[error("input must not be empty")]
    EmptyInput,
    #[error("input length must not exceed {max} bytes (got {len})")]
    TooLarge { len: usize, max: usize },
    #[error("invalid UTF-8: {0}")]
    InvalidEncoding(String),
    #[error("invalid RAML: expected RAML comment line")]
    InvalidRaml,
    #[error("invalid YAML: {0}")]
    InvalidYaml(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Outcome of a successful preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preflight {
    pub format: AssetFormat,
    /// Byte-order mark found in front of the content, if any.
    pub bom: Option<ByteOrderMark>,
    /// JSON rendering of YAML/RAML input. `None` for JSON input.
    pub transcoded: Option<Vec<u8>>,
}

impl Preflight {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Reject empty input and input above `MAX_ASSET_LEN`.
pub fn check_size(content: &[u8]) -> Result<(), PreflightError> {
    if content.is_empty() {
        return Err(PreflightError::EmptyInput);
    }
    if content.len() > MAX_ASSET_LEN {
        return Err(PreflightError::TooLarge {
            len: content.len(),
            max: MAX_ASSET_LEN,
        });
    }
    Ok(())
}

/// Run every preflight stage over `content`, classified by the name `file`.
pub fn preflight(content: &[u8], file: &str) -> Result<Preflight, PreflightError> {
    check_size(content)?;
    let bom = encoding::check(content)?;
    let format = AssetFormat::classify(file);
    debug!(file, %format, ?bom, len = content.len(), "preflighting asset");
    let transcoded = structure::validate(content, bom, format)?;
    Ok(Preflight {
        format,
        bom,
        transcoded,
    })
}
