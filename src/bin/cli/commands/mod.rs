pub mod analyze;
pub mod item;
pub mod notification;

use std::path::Path;

use lostfound::ai::ImageData;

/// Mime type for a photo, judged by its file extension
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// Reads a photo from disk and encodes it as a data URL
pub fn read_image_as_data_url(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let mime_type = image_mime_type(path)
        .ok_or_else(|| format!("Unsupported image type: {}", path.display()))?;
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(ImageData::from_bytes(mime_type, &bytes).to_data_url())
}
