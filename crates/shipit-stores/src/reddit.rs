//! Reddit integration
//!
//! Posts announcements through the Reddit OAuth API.
//!
//! ## Authentication
//!
//! Uses the "script" app password grant: the app's client id and secret
//! (`reddit client id` / `reddit client secret` in the credential store)
//! authenticate the token request, and the bot account's username and
//! password are the grant.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shipit_core::config::AnnounceConfig;
use shipit_core::CredentialStore;
use tracing::{debug, info, instrument};

use crate::announce::AnnouncementSession;
use crate::error::{Result, StoreError};
use crate::login::Authenticator;
use crate::types::PostRef;

/// Credential store key of the app's client id
pub const CLIENT_ID_KEY: &str = "reddit client id";

/// Credential store key of the app's client secret
pub const CLIENT_SECRET_KEY: &str = "reddit client secret";

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// `api_type=json` response envelope
#[derive(Debug, Deserialize)]
struct JsonEnvelope {
    json: JsonBody,
}

#[derive(Debug, Deserialize)]
struct JsonBody {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    name: String,
    url: Option<String>,
}

/// Logs the bot account in with the password grant
#[derive(Clone)]
pub struct RedditAuthenticator {
    client: Client,
    config: AnnounceConfig,
    client_id: String,
    client_secret: String,
}

impl RedditAuthenticator {
    /// Create an authenticator for a registered app
    pub fn new(config: &AnnounceConfig, client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
            client_id,
            client_secret,
        }
    }

    /// Create an authenticator, taking the app credentials from the store
    pub fn from_store(config: &AnnounceConfig, credentials: &mut CredentialStore) -> Result<Self> {
        let client_id = credentials.get(CLIENT_ID_KEY)?;
        let client_secret = credentials.get_secret_hidden(CLIENT_SECRET_KEY)?;
        Ok(Self::new(config, client_id, client_secret))
    }
}

#[async_trait]
impl Authenticator for RedditAuthenticator {
    type Session = RedditSession;

    fn service(&self) -> &str {
        "reddit"
    }

    #[instrument(skip(self, password))]
    async fn authenticate(&self, user: &str, password: &str) -> Result<RedditSession> {
        let url = format!(
            "{}/api/v1/access_token",
            self.config.auth_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", user),
                ("password", password),
            ])
            .send()
            .await?;

        let status = response.status();
        // 401 means the app's client id/secret were rejected, not the account
        if status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::AuthenticationFailed(format!(
                "Reddit rejected the app credentials; remove '{}' and '{}' from the credential file",
                CLIENT_ID_KEY, CLIENT_SECRET_KEY
            )));
        }
        if !status.is_success() {
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let token: TokenResponse = response.json().await?;
        match (token.access_token, token.error) {
            (Some(access_token), None) => {
                info!("Reddit session ready");
                Ok(RedditSession {
                    client: self.client.clone(),
                    api_url: self.config.api_url.trim_end_matches('/').to_string(),
                    user_agent: self.config.user_agent.clone(),
                    access_token,
                })
            }
            (_, Some(error)) if error == "invalid_grant" => Err(StoreError::InvalidCredentials(
                "Reddit rejected the username or password".to_string(),
            )),
            (_, error) => Err(StoreError::AuthenticationFailed(
                error.unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }
}

/// Bearer-token session for the bot account
#[derive(Clone)]
pub struct RedditSession {
    client: Client,
    api_url: String,
    user_agent: String,
    access_token: String,
}

impl RedditSession {
    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<JsonBody> {
        let url = format!("{}{}", self.api_url, endpoint);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: JsonEnvelope = response.json().await?;
        if !envelope.json.errors.is_empty() {
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: serde_json::to_string(&envelope.json.errors)?,
            });
        }
        Ok(envelope.json)
    }
}

#[async_trait]
impl AnnouncementSession for RedditSession {
    #[instrument(skip(self, body))]
    async fn submit(&self, forum: &str, title: &str, body: &str) -> Result<PostRef> {
        let result = self
            .post_form(
                "/api/submit",
                &[
                    ("api_type", "json"),
                    ("kind", "self"),
                    ("sr", forum),
                    ("title", title),
                    ("text", body),
                ],
            )
            .await?;
        let data = result
            .data
            .ok_or_else(|| StoreError::Other("submit response has no post data".to_string()))?;
        Ok(PostRef {
            fullname: data.name,
            forum: forum.to_string(),
            url: data.url,
        })
    }

    #[instrument(skip(self, post), fields(post = %post.fullname))]
    async fn set_flair(&self, post: &PostRef, text: &str, css_class: &str) -> Result<()> {
        self.post_form(
            &format!("/r/{}/api/flair", post.forum),
            &[
                ("api_type", "json"),
                ("link", post.fullname.as_str()),
                ("text", text),
                ("css_class", css_class),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, post), fields(post = %post.fullname))]
    async fn pin(&self, post: &PostRef) -> Result<()> {
        self.post_form(
            "/api/set_subreddit_sticky",
            &[
                ("api_type", "json"),
                ("id", post.fullname.as_str()),
                ("state", "true"),
            ],
        )
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedditAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditAuthenticator")
            .field("auth_url", &self.config.auth_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RedditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditSession")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::{login_with_retry, CredentialKeys};
    use shipit_core::prompt::ScriptedPrompter;
    use std::sync::Arc;

    #[test]
    fn test_submit_response_parsing() {
        let envelope: JsonEnvelope = serde_json::from_str(
            r#"{"json": {"errors": [], "data": {"url": "https://reddit.com/r/chunky/x", "id": "abc", "name": "t3_abc"}}}"#,
        )
        .unwrap();
        let data = envelope.json.data.unwrap();
        assert_eq!(data.name, "t3_abc");
        assert!(envelope.json.errors.is_empty());
    }

    #[test]
    fn test_flair_response_without_data() {
        let envelope: JsonEnvelope = serde_json::from_str(r#"{"json": {"errors": []}}"#).unwrap();
        assert!(envelope.json.data.is_none());
    }

    #[test]
    fn test_invalid_grant_response() {
        let token: TokenResponse = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(token.access_token.is_none());
        assert_eq!(token.error.as_deref(), Some("invalid_grant"));
    }

    /// Serve `response` to every connection on a local port
    async fn token_endpoint(response: &'static str) -> AnnounceConfig {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&request);
                    if let Some(end) = text.find("\r\n\r\n") {
                        let length = text[..end]
                            .lines()
                            .find_map(|l| {
                                l.to_ascii_lowercase()
                                    .strip_prefix("content-length:")
                                    .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                            })
                            .unwrap_or(0);
                        if request.len() >= end + 4 + length {
                            break;
                        }
                    }
                }
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        AnnounceConfig {
            auth_url: format!("http://{}", addr),
            ..AnnounceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_rejected_app_credentials_end_login() {
        let config = token_endpoint(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let prompter = Arc::new(ScriptedPrompter::new([
            "app", "wrong-secret", "bot", "pw", "bot", "pw",
        ]));
        let mut store = CredentialStore::in_memory(prompter.clone());
        let auth = RedditAuthenticator::from_store(&config, &mut store).unwrap();

        let err = login_with_retry(&auth, &mut store, CredentialKeys::REDDIT)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AuthenticationFailed(_)));
        assert!(err.to_string().contains(CLIENT_SECRET_KEY));
        assert_eq!(prompter.times_asked("reddit user: "), 1);
        assert_eq!(prompter.times_asked("reddit password: "), 1);
    }

    #[tokio::test]
    async fn test_invalid_grant_asks_for_account_again() {
        let config = token_endpoint(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 26\r\nConnection: close\r\n\r\n{\"error\": \"invalid_grant\"}",
        )
        .await;
        let auth = RedditAuthenticator::new(&config, "app".to_string(), "secret".to_string());

        let err = auth.authenticate("bot", "wrong").await.unwrap_err();
        assert!(err.is_invalid_credentials());
    }

    #[test]
    fn test_app_credentials_from_store() {
        let prompter = Arc::new(ScriptedPrompter::new(["app-id", "app-secret"]));
        let mut store = CredentialStore::in_memory(prompter.clone());
        let auth = RedditAuthenticator::from_store(&AnnounceConfig::default(), &mut store).unwrap();
        assert_eq!(auth.client_id, "app-id");
        assert_eq!(
            prompter.asked(),
            vec!["reddit client id: ", "reddit client secret: "]
        );
    }
}
