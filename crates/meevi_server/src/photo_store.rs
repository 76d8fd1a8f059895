//! Filesystem photo storage.
//!
//! # Invariants
//! - Objects live under `<owner_id>/<dog_id>/<uuid>.<ext>` below the root.
//! - Only JPEG, PNG, WebP and GIF up to 5 MiB are accepted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use meevi_core::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug)]
pub enum PhotoError {
    UnsupportedType(String),
    NameMismatch { file_name: String, expected: &'static str },
    TooLarge { size: usize },
    InvalidEncoding,
    Empty,
    Io(std::io::Error),
}

impl Display for PhotoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedType(content_type) => write!(
                f,
                "unsupported content type `{content_type}`; expected image/jpeg|png|webp|gif"
            ),
            Self::TooLarge { size } => write!(
                f,
                "photo is {size} bytes; limit is {MAX_PHOTO_BYTES} bytes"
            ),
            Self::NameMismatch {
                file_name,
                expected,
            } => write!(
                f,
                "file name `{file_name}` does not match the declared type (expected .{expected})"
            ),
            Self::InvalidEncoding => write!(f, "data_base64 is not valid base64"),
            Self::Empty => write!(f, "photo data is empty"),
            Self::Io(err) => write!(f, "photo storage failed: {err}"),
        }
    }
}

impl Error for PhotoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> Result<&'static str, PhotoError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        "image/gif" => Ok("gif"),
        _ => Err(PhotoError::UnsupportedType(content_type.to_string())),
    }
}

/// Rejects a client file name whose extension disagrees with the content type.
///
/// Names without an extension, and empty names, are accepted.
pub fn check_file_name(file_name: &str, extension: &'static str) -> Result<(), PhotoError> {
    let Some((_, raw)) = file_name.trim().rsplit_once('.') else {
        return Ok(());
    };
    let given = match raw.to_ascii_lowercase().as_str() {
        "jpeg" => "jpg".to_string(),
        other => other.to_string(),
    };
    if given == extension {
        Ok(())
    } else {
        Err(PhotoError::NameMismatch {
            file_name: file_name.to_string(),
            expected: extension,
        })
    }
}

/// Decodes an upload body, accepting an optional `data:...;base64,` prefix.
pub fn decode_upload(data_base64: &str) -> Result<Vec<u8>, PhotoError> {
    let payload = match data_base64.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data_base64,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    // Reject before decoding when the encoded size already exceeds the limit.
    let decoded_estimate = compact.len() / 4 * 3;
    if decoded_estimate > MAX_PHOTO_BYTES + 2 {
        return Err(PhotoError::TooLarge {
            size: decoded_estimate,
        });
    }
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| PhotoError::InvalidEncoding)?;
    if bytes.is_empty() {
        return Err(PhotoError::Empty);
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(PhotoError::TooLarge { size: bytes.len() });
    }
    Ok(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Object key relative to the store root, `/`-separated.
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
    public_base_url: String,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes one photo and returns its object key and public URL.
    pub fn save(
        &self,
        owner_id: RecordId,
        dog_id: RecordId,
        extension: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto, PhotoError> {
        let key = format!("{owner_id}/{dog_id}/{}.{extension}", Uuid::new_v4());
        let target = self.root.join(&key);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
        Ok(StoredPhoto {
            url: format!("{}/{key}", self.public_base_url),
            path: key,
        })
    }

    /// Best-effort removal used when a later step fails.
    pub fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.root.join(key));
    }
}

#[cfg(test)]
mod tests {
    use super::{
        check_file_name, decode_upload, extension_for, PhotoError, PhotoStore, MAX_PHOTO_BYTES,
    };
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use uuid::Uuid;

    #[test]
    fn content_types_map_to_extensions() {
        assert_eq!(extension_for("image/jpeg").unwrap(), "jpg");
        assert_eq!(extension_for("IMAGE/PNG; charset=binary").unwrap(), "png");
        assert!(matches!(
            extension_for("application/pdf"),
            Err(PhotoError::UnsupportedType(_))
        ));
    }

    #[test]
    fn file_name_extension_must_match_content_type() {
        assert!(check_file_name("rex.JPEG", "jpg").is_ok());
        assert!(check_file_name("rex.png", "png").is_ok());
        assert!(check_file_name("", "png").is_ok());
        assert!(check_file_name("camera-upload", "webp").is_ok());
        assert!(matches!(
            check_file_name("rex.exe", "png"),
            Err(PhotoError::NameMismatch { expected: "png", .. })
        ));
    }

    #[test]
    fn decode_accepts_data_urls_and_rejects_garbage() {
        let encoded = STANDARD.encode(b"png-bytes");
        assert_eq!(decode_upload(&encoded).unwrap(), b"png-bytes");
        assert_eq!(
            decode_upload(&format!("data:image/png;base64,{encoded}")).unwrap(),
            b"png-bytes"
        );
        assert!(matches!(decode_upload("%%%"), Err(PhotoError::InvalidEncoding)));
        assert!(matches!(decode_upload(""), Err(PhotoError::Empty)));
    }

    #[test]
    fn decode_rejects_oversized_payloads() {
        let encoded = STANDARD.encode(vec![0u8; MAX_PHOTO_BYTES + 1]);
        assert!(matches!(
            decode_upload(&encoded),
            Err(PhotoError::TooLarge { .. })
        ));
    }

    #[test]
    fn save_writes_under_owner_and_dog() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path(), "/photos/");
        let owner = Uuid::new_v4();
        let dog = Uuid::new_v4();

        let stored = store.save(owner, dog, "png", b"abc").unwrap();
        assert!(stored.path.starts_with(&format!("{owner}/{dog}/")));
        assert!(stored.path.ends_with(".png"));
        assert_eq!(stored.url, format!("/photos/{}", stored.path));
        assert_eq!(std::fs::read(dir.path().join(&stored.path)).unwrap(), b"abc");
    }
}
