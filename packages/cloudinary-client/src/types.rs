use serde::Deserialize;

/// Subset of the upload API response we rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bytes: Option<u64>,
}

/// Error envelope returned by Cloudinary on 4xx.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
