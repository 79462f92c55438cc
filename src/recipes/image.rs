//! Base64 recipe image payloads.

use crate::storage::{StorageBackend, StorageError};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Directory, relative to the media root, recipe images are written to.
const IMAGE_DIR: &str = "recipes/images";

#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Decodes `data:image/<type>;base64,<data>` or bare base64.
///
/// The declared type is ignored; the format is sniffed from the bytes.
pub fn decode_image(payload: &str) -> Result<DecodedImage, &'static str> {
    let encoded = match payload.split_once(";base64,") {
        Some((header, data)) if header.starts_with("data:") => data,
        Some(_) => return Err(INVALID_IMAGE),
        None => payload,
    };

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|_| INVALID_IMAGE)?;
    let extension = sniff_extension(&bytes).ok_or(INVALID_IMAGE)?;

    Ok(DecodedImage { bytes, extension })
}

fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Writes the image under a fresh name and returns its storage key.
pub async fn store_image(
    storage: &dyn StorageBackend,
    image: DecodedImage,
) -> Result<String, StorageError> {
    let key = format!("{}/{}.{}", IMAGE_DIR, uuid::Uuid::new_v4(), image.extension);
    storage.put_object(image.bytes, &key).await?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 transparent PNG.
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_data_uri() {
        let image = decode_image(&format!("data:image/png;base64,{}", PIXEL)).unwrap();
        assert_eq!(image.extension, "png");
        assert!(image.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_decode_bare_base64() {
        assert_eq!(decode_image(PIXEL).unwrap().extension, "png");
    }

    #[test]
    fn test_rejects_non_images() {
        let text = STANDARD.encode("just some text");
        assert_eq!(decode_image(&text), Err(INVALID_IMAGE));
        assert_eq!(decode_image("%%%not base64%%%"), Err(INVALID_IMAGE));
        assert_eq!(decode_image(""), Err(INVALID_IMAGE));
    }

    #[test]
    fn test_sniffs_other_formats() {
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(sniff_extension(b"GIF89a\x01\x00"), Some("gif"));
        assert_eq!(sniff_extension(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("webp"));
    }
}
