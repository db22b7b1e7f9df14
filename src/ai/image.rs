use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use thiserror::Error;

/// Mime type assumed for bare base64 payloads
const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// An image inlined into an AI request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub mime_type: String,
    /// Base64 payload, without the data URL header
    pub data: String,
}

/// Reasons an image reference is rejected on a new report
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("data URL must declare a base64-encoded image, got {0:?}")]
    NotAnImage(String),
    #[error("image payload is not valid base64")]
    InvalidBase64,
    #[error("image is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
}

impl ImageData {
    /// Resolves a stored image reference into an inline payload
    ///
    /// Data URLs keep their declared mime type. Bare base64 is assumed to be
    /// JPEG. Remote `http(s)` URLs and anything that does not decode cannot be
    /// inlined and yield `None`.
    pub fn from_reference(reference: &str) -> Option<ImageData> {
        let reference = reference.trim();
        if is_remote(reference) {
            return None;
        }
        let image = if reference.starts_with("data:") {
            parse_data_url(reference).ok()?
        } else {
            ImageData {
                mime_type: DEFAULT_MIME_TYPE.to_string(),
                data: reference.to_string(),
            }
        };
        image.decoded_len().ok().map(|_| image)
    }

    /// Number of bytes the payload decodes to
    pub fn decoded_len(&self) -> Result<usize, ImageError> {
        if self.data.is_empty() {
            return Err(ImageError::InvalidBase64);
        }
        STANDARD
            .decode(&self.data)
            .map(|bytes| bytes.len())
            .map_err(|_| ImageError::InvalidBase64)
    }

    /// Encodes raw image bytes as an inline payload
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> ImageData {
        ImageData {
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Renders the payload as a `data:` URL
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Checks an image reference submitted with a report
///
/// Remote URLs are accepted as-is. Inline images must decode and must not
/// exceed `max_bytes` once decoded.
pub fn validate_reference(reference: &str, max_bytes: usize) -> Result<(), ImageError> {
    let reference = reference.trim();
    if is_remote(reference) {
        return Ok(());
    }
    let image = if reference.starts_with("data:") {
        parse_data_url(reference)?
    } else {
        ImageData {
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            data: reference.to_string(),
        }
    };
    let size = image.decoded_len()?;
    if size > max_bytes {
        return Err(ImageError::TooLarge { size, max: max_bytes });
    }
    Ok(())
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Splits `data:image/<subtype>;base64,<payload>` into its parts
fn parse_data_url(url: &str) -> Result<ImageData, ImageError> {
    let rest = url.strip_prefix("data:").unwrap_or(url);
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::NotAnImage(rest.chars().take(32).collect()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .filter(|mime| is_image_mime(mime))
        .ok_or_else(|| ImageError::NotAnImage(header.to_string()))?;
    Ok(ImageData {
        mime_type: mime_type.to_string(),
        data: payload.to_string(),
    })
}

fn is_image_mime(mime: &str) -> bool {
    match mime.strip_prefix("image/") {
        Some(subtype) => {
            !subtype.is_empty()
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
        }
        None => false,
    }
}
