//! Cloudinary signed-upload credential issuance and connectivity probe.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{
    config::CloudinaryConfig,
    error::{AppError, AppResult},
};

type HmacSha1 = Hmac<Sha1>;

/// Compute the upload signature: `k=v` pairs sorted by key, joined with
/// `&`, then hex HMAC-SHA1 under the API secret. `timestamp` and `folder`
/// are always present, `public_id` only when supplied.
pub fn sign_upload(
    api_secret: &str,
    folder: &str,
    public_id: Option<&str>,
    timestamp: i64,
) -> String {
    let mut params: Vec<(&str, String)> = vec![
        ("folder", folder.to_string()),
        ("timestamp", timestamp.to_string()),
    ];
    if let Some(id) = public_id {
        params.push(("public_id", id.to_string()));
    }
    params.sort_by(|a, b| a.0.cmp(b.0));

    let payload = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = HmacSha1::new_from_slice(api_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Probe the Cloudinary admin usage endpoint. Returns (status, message),
/// never an error: a failed probe is itself the reportable outcome.
pub async fn check_status(http: &reqwest::Client, config: &CloudinaryConfig) -> (String, String) {
    let (cloud_name, api_key, api_secret) = match (
        config.cloud_name.as_deref(),
        config.api_key.as_deref(),
        config.api_secret.as_deref(),
    ) {
        (Some(c), Some(k), Some(s)) => (c, k, s),
        _ => {
            return (
                "error".to_string(),
                "Cloudinary credentials are not configured".to_string(),
            );
        }
    };

    let url = format!("https://api.cloudinary.com/v1_1/{cloud_name}/usage");
    match http
        .get(&url)
        .basic_auth(api_key, Some(api_secret))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => (
            "success".to_string(),
            "Connexion à Cloudinary établie avec succès".to_string(),
        ),
        Ok(resp) => (
            "error".to_string(),
            format!("Erreur de connexion à Cloudinary: HTTP {}", resp.status()),
        ),
        Err(e) => (
            "error".to_string(),
            format!("Erreur de connexion à Cloudinary: {e}"),
        ),
    }
}

pub fn require_secret(config: &CloudinaryConfig) -> AppResult<&str> {
    config
        .api_secret
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("CLOUDINARY_API_SECRET is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_and_sorted() {
        let a = sign_upload("secret", "designs", Some("d1"), 1700000000);
        let b = sign_upload("secret", "designs", Some("d1"), 1700000000);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40); // hex SHA-1
    }

    #[test]
    fn public_id_changes_the_signature() {
        let with = sign_upload("secret", "designs", Some("d1"), 1700000000);
        let without = sign_upload("secret", "designs", None, 1700000000);
        assert_ne!(with, without);
    }

    #[test]
    fn signature_depends_on_secret() {
        let a = sign_upload("secret-a", "profiles", None, 1700000000);
        let b = sign_upload("secret-b", "profiles", None, 1700000000);
        assert_ne!(a, b);
    }
}
