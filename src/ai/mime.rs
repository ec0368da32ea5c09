/// Sniff the content type of generated image bytes. Unknown formats are
/// reported as PNG, which is what the SDXL models produce.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), serving as image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// File extension for a content type returned by the gateway.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.split(';').next().map(str::trim) {
        Some("image/jpeg") => "jpg",
        Some("image/webp") => "webp",
        _ => "png",
    }
}
