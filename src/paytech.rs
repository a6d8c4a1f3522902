//! Minimal Paytech payment-session client.

use serde::{Deserialize, Serialize};

use crate::{
    config::PaytechConfig,
    error::{AppError, AppResult},
};

const CREATE_PATH: &str = "/api/payment/request/create";

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    pub item_name: String,
    pub item_price: i64,
    pub currency: String,
    pub ref_command: String,
    pub command_name: String,
    pub success_url: String,
    pub cancel_url: String,
    pub ipn_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub token: Option<String>,
    pub redirect_url: String,
}

/// Request a hosted payment page from Paytech. Errors from the provider
/// surface as `AppError::Upstream`; nothing is retried.
pub async fn create_session(
    http: &reqwest::Client,
    config: &PaytechConfig,
    request: &CreateSessionRequest,
) -> AppResult<CreateSessionResponse> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("PAYTECH_API_KEY is not set")))?;
    let secret_key = config
        .secret_key
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("PAYTECH_SECRET_KEY is not set")))?;

    let url = format!("{}{}", config.base_url, CREATE_PATH);
    let response = http
        .post(&url)
        .header("API_KEY", api_key)
        .header("API_SECRET", secret_key)
        .json(request)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("paytech request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "paytech returned {status}: {body}"
        )));
    }

    response
        .json::<CreateSessionResponse>()
        .await
        .map_err(|e| AppError::Upstream(format!("invalid paytech response: {e}")))
}
