//! Signed image uploads to Cloudinary.
//!
//! Uploads go to `POST /v1_1/<cloud>/image/upload` as a form whose `file` is
//! a base64 `data:` URI. Every upload is signed: the sorted, `&`-joined
//! parameters plus the API secret are hashed with the configured algorithm.

use super::{ImageUploader, UploadedImage};
use crate::rollup::chart::Chart;
use crate::{Error, Result};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Cloudinary API base URL
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

/// Hash used to sign upload parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(Error::InvalidInput(format!(
                "signature-algorithm must be \"sha1\" or \"sha256\", got \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Response from the upload endpoint (only fields we care about).
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

pub struct CloudinaryUploader {
    credentials: CloudinaryCredentials,
    agent: ureq::Agent,
}

impl CloudinaryUploader {
    pub fn new(credentials: CloudinaryCredentials) -> Self {
        Self {
            credentials,
            agent: ureq::Agent::new(),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            CLOUDINARY_API_BASE, self.credentials.cloud_name
        )
    }

    /// Signed form fields for an upload of `file` as `public_id`.
    fn form_fields(&self, file: String, public_id: &str, timestamp: i64) -> Vec<(&'static str, String)> {
        let creds = &self.credentials;
        let mut signed = vec![
            ("folder", creds.folder.clone()),
            ("overwrite", "true".to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = sign(&signed, &creds.api_secret, creds.signature_algorithm);

        signed.push(("file", file));
        signed.push(("api_key", creds.api_key.clone()));
        signed.push(("signature", signature));
        if creds.signature_algorithm == SignatureAlgorithm::Sha256 {
            signed.push(("signature_algorithm", "sha256".to_string()));
        }
        signed
    }
}

impl ImageUploader for CloudinaryUploader {
    fn upload(&self, chart: &Chart, public_id: &str) -> Result<UploadedImage> {
        let timestamp = chrono::Utc::now().timestamp();
        let fields = self.form_fields(chart.data_uri(), public_id, timestamp);
        let form: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let response = self.agent.post(&self.upload_url()).send_form(&form);

        match response {
            Ok(resp) => {
                let uploaded: UploadResponse = resp
                    .into_json()
                    .map_err(|e| Error::Other(format!("Failed to parse upload response: {}", e)))?;
                Ok(UploadedImage {
                    url: uploaded.secure_url,
                    public_id: uploaded.public_id,
                })
            }
            Err(e) => Err(classify_upload_error(e)),
        }
    }
}

/// Map an upload failure, separating timeouts reported after the upload
/// may already have been stored.
fn classify_upload_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            Error::Http { status: code, body }.into_late_timeout()
        }
        ureq::Error::Transport(t) if t.kind() == ureq::ErrorKind::Io => {
            Error::Transport(t.to_string()).into_late_timeout()
        }
        ureq::Error::Transport(t) => Error::Transport(t.to_string()),
    }
}

/// Signature over `params`: sorted `key=value` pairs joined by `&`, with the
/// secret appended, hex-encoded.
pub fn sign(params: &[(&str, String)], secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let payload = format!("{}{}", joined, secret);

    match algorithm {
        SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(payload.as_bytes())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader(algorithm: SignatureAlgorithm) -> CloudinaryUploader {
        CloudinaryUploader::new(CloudinaryCredentials {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "notion-charts".to_string(),
            signature_algorithm: algorithm,
        })
    }

    #[test]
    fn test_sign_matches_reference_example() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        assert_eq!(
            sign(&params, "abcd", SignatureAlgorithm::Sha1),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
        assert_eq!(
            sign(&params, "abcd", SignatureAlgorithm::Sha256),
            "cc927e1290f9e3ae4c1a741eda21a4630b4ce80f9ce0bc0296337d25cf40f91e"
        );
    }

    #[test]
    fn test_form_fields_are_signed() {
        let fields = uploader(SignatureAlgorithm::Sha1).form_fields(
            "data:image/svg+xml;base64,AA==".to_string(),
            "week_2024-01-01_to_2024-01-07",
            1704067200,
        );
        let get = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("signature"), Some("d210eedb289d2f608532ddb871810adb663a2389"));
        assert_eq!(get("api_key"), Some("key"));
        assert_eq!(get("overwrite"), Some("true"));
        assert_eq!(get("signature_algorithm"), None);
    }

    #[test]
    fn test_sha256_announces_algorithm() {
        let fields = uploader(SignatureAlgorithm::Sha256).form_fields(String::new(), "id", 1);
        assert!(fields
            .iter()
            .any(|(k, v)| *k == "signature_algorithm" && v == "sha256"));
    }

    #[test]
    fn test_upload_url() {
        assert_eq!(
            uploader(SignatureAlgorithm::Sha1).upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    fn status_error(code: u16, text: &str, body: &str) -> ureq::Error {
        ureq::Error::Status(code, ureq::Response::new(code, text, body).unwrap())
    }

    #[test]
    fn test_client_closed_request_is_late_timeout() {
        let err = classify_upload_error(status_error(499, "Request Timeout", ""));
        assert!(err.is_late_timeout(), "got {:?}", err);

        let err = classify_upload_error(status_error(408, "Request Timeout", ""));
        assert!(err.is_late_timeout(), "got {:?}", err);
    }

    #[test]
    fn test_timeout_body_is_late_timeout() {
        let body = r#"{"error":{"message":"Request Timeout"}}"#;
        let err = classify_upload_error(status_error(500, "Internal Server Error", body));
        assert!(err.is_late_timeout(), "got {:?}", err);
    }

    #[test]
    fn test_rejected_upload_is_http_error() {
        let body = r#"{"error":{"message":"Invalid Signature"}}"#;
        match classify_upload_error(status_error(401, "Unauthorized", body)) {
            Error::Http { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid Signature"));
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("SHA256".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Sha256);
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
    }
}
