/// Uploaded post images
///
/// Images are checked by decoding them, then written to
/// `{media_root}/posts/<uuid>.<ext>`. Posts store the path relative to the
/// media root, which is also the path under `/media/` they are served from.
use image::ImageFormat;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

const POSTS_DIR: &str = "posts";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for crate::error::AppError {
    fn from(err: MediaError) -> Self {
        crate::error::AppError::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode `bytes` to make sure they are a real image, returning its format
    pub async fn inspect(bytes: Vec<u8>) -> Result<(ImageFormat, Vec<u8>), MediaError> {
        tokio::task::spawn_blocking(move || {
            let format = image::guess_format(&bytes)
                .map_err(|e| MediaError::InvalidImage(e.to_string()))?;
            image::load_from_memory_with_format(&bytes, format)
                .map_err(|e| MediaError::InvalidImage(e.to_string()))?;
            Ok((format, bytes))
        })
        .await
        .map_err(|e| MediaError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Write an inspected image, returning its media-relative path
    pub async fn save(&self, format: ImageFormat, bytes: &[u8]) -> Result<String, MediaError> {
        let ext = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{}/{}.{}", POSTS_DIR, Uuid::new_v4(), ext);

        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.root.join(&relative), bytes).await?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored uploaded image");
        Ok(relative)
    }

    /// Remove a stored image; a file that is already gone is not an error
    pub async fn remove(&self, relative: &str) -> Result<(), MediaError> {
        let Some(path) = self.resolve(relative) else {
            return Ok(());
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Filesystem path for a media-relative path; `None` if it would leave the root
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        if relative.as_os_str().is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

/// Content type served for a stored file
pub fn content_type_for(path: &Path) -> mime::Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("svg") => mime::IMAGE_SVG,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// URL a stored image is served from
pub fn media_url(relative: &str) -> String {
    format!("/media/{}", relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_inspect_accepts_png() {
        let (format, _) = MediaStore::inspect(png_bytes()).await.unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_inspect_rejects_text() {
        let err = MediaStore::inspect(b"definitely not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let relative = store.save(ImageFormat::Png, &png_bytes()).await.unwrap();
        assert!(relative.starts_with("posts/"));
        assert!(relative.ends_with(".png"));

        let path = store.resolve(&relative).unwrap();
        assert!(path.exists());

        store.remove(&relative).await.unwrap();
        assert!(!path.exists());
        store.remove(&relative).await.unwrap();
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = MediaStore::new("/srv/media");
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("posts/../../x").is_none());
        assert!(store.resolve("").is_none());
        assert_eq!(
            store.resolve("posts/a.png"),
            Some(PathBuf::from("/srv/media/posts/a.png"))
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for(Path::new("posts/a.PNG")), mime::IMAGE_PNG);
        assert_eq!(content_type_for(Path::new("posts/a.jpg")), mime::IMAGE_JPEG);
        assert_eq!(
            content_type_for(Path::new("posts/a.bin")),
            mime::APPLICATION_OCTET_STREAM
        );
    }
}
