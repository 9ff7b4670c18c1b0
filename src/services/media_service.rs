use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::message::MediaType;

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "webm", "mov"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "ogg", "m4a"];
const DOCUMENT_EXTS: &[&str] = &["pdf", "doc", "docx", "txt", "zip"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub url: String,
    pub media_type: MediaType,
    pub path: PathBuf,
}

/// Maps an upload to its media type, checking magic bytes where the format has them.
pub fn classify_upload(filename: &str, data: &[u8]) -> Result<(String, MediaType)> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| Error::BadRequest("File has no extension".into()))?;

    let media_type = if IMAGE_EXTS.contains(&ext.as_str()) {
        MediaType::Image
    } else if VIDEO_EXTS.contains(&ext.as_str()) {
        MediaType::Video
    } else if AUDIO_EXTS.contains(&ext.as_str()) {
        MediaType::Audio
    } else if DOCUMENT_EXTS.contains(&ext.as_str()) {
        MediaType::Document
    } else {
        return Err(Error::BadRequest(format!("File type .{} is not allowed", ext)));
    };

    let signature_ok = match ext.as_str() {
        "pdf" => data.starts_with(b"%PDF"),
        "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8]),
        "gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        "webp" => data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP",
        _ => true,
    };
    if !signature_ok {
        return Err(Error::BadRequest(format!(
            "File content does not match .{}",
            ext
        )));
    }

    Ok((ext, media_type))
}

#[derive(Clone)]
pub struct MediaService {
    root: PathBuf,
    max_bytes: usize,
}

impl MediaService {
    pub fn new(uploads_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: uploads_dir.into(),
            max_bytes,
        }
    }

    pub async fn store(&self, filename: &str, data: &Bytes) -> Result<StoredMedia> {
        if data.is_empty() {
            return Err(Error::BadRequest("Uploaded file is empty".into()));
        }
        if data.len() > self.max_bytes {
            return Err(Error::BadRequest(format!(
                "File exceeds the {} MB upload limit",
                self.max_bytes / (1024 * 1024)
            )));
        }
        let (ext, media_type) = classify_upload(filename, data)?;

        let dir = self.root.join("media");
        fs::create_dir_all(&dir).await?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = dir.join(&stored_name);
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write media file: {}", e);
            Error::Internal(format!("Failed to save file: {}", e))
        })?;

        Ok(StoredMedia {
            url: format!("/uploads/media/{}", stored_name),
            media_type,
            path,
        })
    }

    /// Removes a stored file that never made it into a message.
    pub async fn discard(&self, stored: &StoredMedia) {
        if let Err(e) = fs::remove_file(&stored.path).await {
            tracing::warn!(path = %stored.path.display(), error = %e, "failed to remove orphaned media");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(
            classify_upload("clip.MP4", b"anything").unwrap(),
            ("mp4".to_string(), MediaType::Video)
        );
        assert_eq!(
            classify_upload("voice.ogg", b"OggS").unwrap().1,
            MediaType::Audio
        );
        assert_eq!(
            classify_upload("notes.txt", b"hello").unwrap().1,
            MediaType::Document
        );
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        assert!(classify_upload("run.exe", b"MZ").is_err());
        assert!(classify_upload("README", b"text").is_err());
    }

    #[test]
    fn magic_bytes_must_match() {
        assert!(classify_upload("a.png", &[0x89, 0x50, 0x4E, 0x47, 0x0D]).is_ok());
        assert!(classify_upload("a.png", b"<html>").is_err());
        assert!(classify_upload("a.pdf", b"%PDF-1.7").is_ok());
        assert!(classify_upload("a.pdf", b"PK\x03\x04").is_err());
        assert!(classify_upload("a.webp", b"RIFF\0\0\0\0WEBPVP8 ").is_ok());
        assert!(classify_upload("a.webp", b"RIFF").is_err());
        assert!(classify_upload("a.gif", b"GIF89a....").is_ok());
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let service = MediaService::new(&dir, 1024);
        let stored = service
            .store("photo.jpg", &Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]))
            .await
            .unwrap();
        assert_eq!(stored.media_type, MediaType::Image);
        assert!(stored.url.starts_with("/uploads/media/"));
        let name = stored.url.trim_start_matches("/uploads/media/");
        assert_eq!(stored.path, dir.join("media").join(name));
        assert!(stored.path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn discard_removes_the_stored_file() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let service = MediaService::new(&dir, 1024);
        let stored = service
            .store("scan.pdf", &Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();
        assert!(stored.path.exists());

        service.discard(&stored).await;
        assert!(!stored.path.exists());
        // A second discard only logs.
        service.discard(&stored).await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn store_enforces_size_limit() {
        let service = MediaService::new(std::env::temp_dir(), 4);
        let err = service
            .store("a.txt", &Bytes::from_static(b"too long"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        let err = service.store("a.txt", &Bytes::new()).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
