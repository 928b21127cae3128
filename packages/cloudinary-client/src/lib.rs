//! Pure Cloudinary upload client.
//!
//! Supports signed image uploads into a folder with a size-limiting
//! transformation. Nothing else from the Cloudinary API is wrapped.
//!
//! # Example
//!
//! ```rust,ignore
//! use cloudinary_client::{CloudinaryClient, CloudinaryOptions};
//!
//! let client = CloudinaryClient::new(CloudinaryOptions {
//!     cloud_name: "demo".into(),
//!     api_key: "1234".into(),
//!     api_secret: "secret".into(),
//!     folder: "DREAMarket".into(),
//! });
//! let image = client.upload_image("front.jpg", "image/jpeg", bytes).await?;
//! println!("{}", image.secure_url);
//! ```

pub mod types;

pub use types::UploadedImage;

use reqwest::multipart::{Form, Part};
use sha2::{Digest, Sha256};
use types::ErrorResponse;

const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Listing photos are capped at 800x600, matching the feed card size.
const UPLOAD_TRANSFORMATION: &str = "c_limit,h_600,w_800";

#[derive(Debug, thiserror::Error)]
pub enum CloudinaryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloudinary returned {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, CloudinaryError>;

#[derive(Debug, Clone)]
pub struct CloudinaryOptions {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

pub struct CloudinaryClient {
    client: reqwest::Client,
    options: CloudinaryOptions,
}

impl CloudinaryClient {
    pub fn new(options: CloudinaryOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            options,
        }
    }

    /// Compute the upload signature.
    ///
    /// Signed parameters are sorted by name, joined as `k=v&k=v`, suffixed
    /// with the API secret and hashed with SHA-256.
    fn sign(&self, timestamp: i64) -> String {
        let mut params = [
            ("folder", self.options.folder.clone()),
            ("timestamp", timestamp.to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ];
        params.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.options.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Upload one image and return its hosted URL.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.sign(timestamp);

        let file = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.options.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.options.folder.clone())
            .text("transformation", UPLOAD_TRANSFORMATION)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let url = format!("{}/{}/image/upload", BASE_URL, self.options.cloud_name);
        let resp = self.client.post(&url).multipart(form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CloudinaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let image: UploadedImage = resp.json().await?;
        tracing::info!(public_id = %image.public_id, "Uploaded image");
        Ok(image)
    }
}
