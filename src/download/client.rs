//! Twitter REST client using app-only (OAuth2 bearer token) authentication

use std::time::Duration;

use serde::Deserialize;

use super::keys::Keys;
use super::status::Status;
use super::{DownloadError, TweetSource};

const API_BASE: &str = "https://api.twitter.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

pub struct TwitterClient {
    agent: ureq::Agent,
    base_url: String,
    bearer: String,
}

impl TwitterClient {
    pub fn connect(keys: &Keys) -> Result<Self, DownloadError> {
        Self::connect_to(API_BASE, keys)
    }

    /// Authenticate against an alternative API root
    pub fn connect_to(base_url: &str, keys: &Keys) -> Result<Self, DownloadError> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        let base_url = base_url.trim_end_matches('/').to_string();
        let bearer = request_bearer_token(&agent, &base_url, keys)?;
        Ok(Self {
            agent,
            base_url,
            bearer,
        })
    }
}

fn request_bearer_token(agent: &ureq::Agent, base_url: &str, keys: &Keys) -> Result<String, DownloadError> {
    let mut response = agent
        .post(format!("{base_url}/oauth2/token"))
        .header("Authorization", format!("Basic {}", keys.basic_credentials()))
        .send_form([("grant_type", "client_credentials")])
        .map_err(|e| match e {
            ureq::Error::StatusCode(code @ (401 | 403)) => {
                DownloadError::Auth(format!("token request rejected with HTTP {code}"))
            }
            other => map_ureq_error(other),
        })?;
    let token: TokenResponse = response
        .body_mut()
        .read_json()
        .map_err(|e| DownloadError::Decode(e.to_string()))?;
    if !token.token_type.eq_ignore_ascii_case("bearer") {
        return Err(DownloadError::Auth(format!(
            "unexpected token type \"{}\"",
            token.token_type
        )));
    }
    Ok(token.access_token)
}

fn map_ureq_error(err: ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(429) => DownloadError::RateLimited,
        ureq::Error::StatusCode(code) => DownloadError::Status(code),
        other => DownloadError::Http(other.to_string()),
    }
}

impl TweetSource for TwitterClient {
    fn user_timeline(
        &self,
        screen_name: &str,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Status>, DownloadError> {
        let mut request = self
            .agent
            .get(format!("{}/1.1/statuses/user_timeline.json", self.base_url))
            .header("Authorization", format!("Bearer {}", self.bearer))
            .query("screen_name", screen_name)
            .query("count", count.to_string())
            .query("tweet_mode", "extended")
            .query("include_rts", "true");
        if let Some(id) = max_id {
            request = request.query("max_id", id.to_string());
        }

        let mut response = request.call().map_err(map_ureq_error)?;
        response
            .body_mut()
            .read_json::<Vec<Status>>()
            .map_err(|e| DownloadError::Decode(e.to_string()))
    }
}
