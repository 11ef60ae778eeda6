pub mod cloudinary;

use axum::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use tracing::warn;

pub use cloudinary::CloudinaryHost;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image host is not configured")]
    NotConfigured,

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image host rejected the request: {0}")]
    Rejected(String),
}

/// Durable reference to an uploaded asset: the public URL plus the id needed
/// to delete it later.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

/// An image file extracted from a multipart request, held in memory until it
/// is forwarded to the external host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub filename: String,
}

/// The external image hosting service. Receives an in-memory buffer, returns
/// a durable URL and a deletable reference id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        filename: &str,
    ) -> Result<UploadedAsset, UploadError>;

    async fn delete(&self, public_id: &str) -> Result<(), UploadError>;
}

/// Stand-in used when no image host credentials are configured. Upload
/// endpoints fail with a clear message instead of the process refusing to
/// start.
pub struct UnconfiguredHost;

#[async_trait]
impl ImageHost for UnconfiguredHost {
    async fn upload(
        &self,
        _data: Bytes,
        _folder: &str,
        _filename: &str,
    ) -> Result<UploadedAsset, UploadError> {
        Err(UploadError::NotConfigured)
    }

    async fn delete(&self, _public_id: &str) -> Result<(), UploadError> {
        Err(UploadError::NotConfigured)
    }
}

/// Delete an external asset without letting a cleanup failure surface.
///
/// A record's own deletion or replacement must never be blocked by an
/// inability to remove the old asset; failures are logged only.
pub async fn delete_best_effort(host: &dyn ImageHost, public_id: Option<&str>) {
    let Some(public_id) = public_id else {
        return;
    };
    if let Err(e) = host.delete(public_id).await {
        warn!("Failed to delete external asset {}: {}", public_id, e);
    }
}

/// An `image` file plus accompanying text fields, as parsed from a
/// `multipart/form-data` request.
pub struct ImageForm {
    pub image: Option<ImageUpload>,
    pub fields: std::collections::HashMap<String, String>,
}

/// Parse a multipart upload request. The file goes into `image`, every other
/// part is collected as a text field. Non-image files are rejected.
pub async fn parse_image_form(
    mut multipart: axum::extract::Multipart,
) -> Result<ImageForm, String> {
    let mut image = None;
    let mut fields = std::collections::HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed multipart request: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(|s| s.to_string());
            if !is_allowed_image(&filename, content_type.as_deref()) {
                return Err(
                    "Only image files are allowed (jpeg, jpg, png, gif, webp)".to_string()
                );
            }
            let data = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read image data: {}", e))?;
            image = Some(ImageUpload { data, filename });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| format!("Failed to read field {}: {}", name, e))?;
            fields.insert(name, value);
        }
    }

    Ok(ImageForm { image, fields })
}

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// File filter for image uploads: both the filename extension and the
/// declared content type have to look like an allowed image format.
pub fn is_allowed_image(filename: &str, content_type: Option<&str>) -> bool {
    let ext_ok = filename
        .rsplit('.')
        .next()
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false);

    let mime_ok = match content_type {
        Some(mime) => {
            let mime = mime.to_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|ext| mime == format!("image/{}", ext))
        }
        // Some clients omit the part content type; the extension check still applies.
        None => true,
    };

    ext_ok && mime_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_image_extensions() {
        assert!(is_allowed_image("photo.jpg", Some("image/jpeg")));
        assert!(is_allowed_image("photo.JPG", Some("image/jpeg")));
        assert!(is_allowed_image("banner.webp", Some("image/webp")));
        assert!(is_allowed_image("logo.png", None));
        assert!(!is_allowed_image("report.pdf", Some("application/pdf")));
        assert!(!is_allowed_image("archive.zip", None));
        assert!(!is_allowed_image("noextension", None));
    }

    #[test]
    fn test_mismatched_mime_is_rejected() {
        // Extension says image, declared type says otherwise.
        assert!(!is_allowed_image("fake.png", Some("text/html")));
    }

    #[tokio::test]
    async fn test_unconfigured_host_rejects_uploads() {
        let host = UnconfiguredHost;
        let err = host
            .upload(Bytes::from_static(b"fake"), "banners", "a.png")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, UploadError::NotConfigured));
    }

    #[tokio::test]
    async fn test_delete_best_effort_swallows_failures() {
        let mut mock = MockImageHost::new();
        mock.expect_delete()
            .times(1)
            .returning(|_| Err(UploadError::Rejected("not found".to_string())));

        // Must not panic or propagate.
        delete_best_effort(&mock, Some("banners/old")).await;
    }

    #[tokio::test]
    async fn test_delete_best_effort_skips_missing_id() {
        let mut mock = MockImageHost::new();
        mock.expect_delete().times(0);

        delete_best_effort(&mock, None).await;
    }
}
