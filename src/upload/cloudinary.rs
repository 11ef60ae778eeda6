use axum::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::time::Duration;
use tracing::info;

use super::{ImageHost, UploadError, UploadedAsset};
use crate::config::CloudinaryConfig;

/// Cloudinary REST client. Uploads go to the authenticated upload endpoint
/// with a SHA-1 request signature; deletes use the destroy endpoint.
#[derive(Clone)]
pub struct CloudinaryHost {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct HostError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    error: Option<HostError>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: Option<String>,
    error: Option<HostError>,
}

/// Compute the request signature: parameters sorted by name, joined as a
/// query string, with the API secret appended, hashed with SHA-1.
fn api_signature(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|&(k, _)| k);

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, config }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        filename: &str,
    ) -> Result<UploadedAsset, UploadError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = api_signature(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let file_part = Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature)
            .part("file", file_part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(UploadError::Rejected(error.message));
        }

        match (body.secure_url, body.public_id) {
            (Some(url), Some(public_id)) => {
                info!("Uploaded asset {} to folder {}", public_id, folder);
                Ok(UploadedAsset { url, public_id })
            }
            _ => Err(UploadError::Rejected(
                "Upload response was missing the asset reference".to_string(),
            )),
        }
    }

    async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = api_signature(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", public_id.to_string())
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await?;

        let body: DestroyResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(UploadError::Rejected(error.message));
        }

        match body.result.as_deref() {
            Some("ok") => {
                info!("Deleted asset {}", public_id);
                Ok(())
            }
            other => Err(UploadError::Rejected(format!(
                "Destroy returned {}",
                other.unwrap_or("no result")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let a = api_signature(&[("folder", "news"), ("timestamp", "1700000000")], "secret");
        let b = api_signature(&[("folder", "news"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40); // SHA-1 hex
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_sorts_parameters() {
        let a = api_signature(&[("timestamp", "1700000000"), ("folder", "news")], "secret");
        let b = api_signature(&[("folder", "news"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_depends_on_secret_and_params() {
        let base = api_signature(&[("timestamp", "1700000000")], "secret");
        assert_ne!(base, api_signature(&[("timestamp", "1700000000")], "other"));
        assert_ne!(base, api_signature(&[("timestamp", "1700000001")], "secret"));
    }

    #[test]
    fn test_endpoint_layout() {
        let host = CloudinaryHost::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        });
        assert_eq!(
            host.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            host.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }
}
