//! HTTP client for `messages.send`.

use rand::Rng;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::ApiError;
use crate::config::BotConfig;
use crate::tokens::{TokenError, TokenRotator};
use crate::types::ApiResponse;

/// Separator placed between message fragments.
pub const MESSAGE_SEPARATOR: &str = "<br>";

/// Method name for sending messages.
const SEND_METHOD: &str = "messages.send";

/// Upper bound (exclusive) of the `random_id` deduplication nonce.
const RANDOM_ID_BOUND: u32 = 10_000;

/// Client for the VK messages API.
#[derive(Debug)]
pub struct VkClient {
    client: reqwest::Client,
    tokens: TokenRotator,
    group_id: u64,
    api_version: String,
    base_url: String,
}

impl VkClient {
    /// Build a client from bot configuration.
    pub fn new(config: &BotConfig) -> Result<Self, TokenError> {
        let tokens = TokenRotator::new(config.access_tokens.clone())?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        let base_url = config.api_base_url.trim_end_matches('/').to_owned();
        debug!(tokens = tokens.len(), %base_url, "VK API client ready");
        Ok(Self {
            client,
            tokens,
            group_id: config.group_id,
            api_version: config.api_version.clone(),
            base_url,
        })
    }

    /// Send a message to `user_id`, joining `fragments` with `<br>`.
    ///
    /// Returns the decoded API result. Non-200 statuses, undecodable bodies
    /// and API-reported errors are all returned as [`ApiError`].
    pub async fn send<I, S>(&self, user_id: i64, fragments: I) -> Result<ApiResponse, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let message = join_fragments(fragments);
        let params = self.send_params(user_id, message);
        let url = format!("{}/{SEND_METHOD}", self.base_url);

        let resp = self.client.post(&url).form(&params).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            let reason = status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_owned();
            warn!(status = status.as_u16(), %reason, "messages.send failed");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                reason,
            });
        }

        let body = resp.bytes().await?;
        let result: ApiResponse = serde_json::from_slice(&body)?;

        if let Some(error) = result.api_error() {
            warn!(code = error.error_code, message = %error.error_msg, "VK API returned an error");
            return Err(ApiError::Api {
                code: error.error_code,
                message: error.error_msg.clone(),
                request_params: error.request_params.clone(),
            });
        }

        debug!(user_id, message_id = ?result.response, "message sent via VK");
        Ok(result)
    }

    /// Form parameters for one `messages.send` call.
    fn send_params(&self, user_id: i64, message: String) -> Vec<(&'static str, String)> {
        vec![
            ("user_id", user_id.to_string()),
            ("random_id", random_id()),
            ("peer_id", format!("-{}", self.group_id)),
            ("message", message),
            ("access_token", self.tokens.next().to_owned()),
            ("v", self.api_version.clone()),
        ]
    }
}

/// Join message fragments with [`MESSAGE_SEPARATOR`].
pub fn join_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut message = String::new();
    for (i, fragment) in fragments.into_iter().enumerate() {
        if i > 0 {
            message.push_str(MESSAGE_SEPARATOR);
        }
        message.push_str(fragment.as_ref());
    }
    message
}

fn random_id() -> String {
    rand::thread_rng().gen_range(0..RANDOM_ID_BOUND).to_string()
}
