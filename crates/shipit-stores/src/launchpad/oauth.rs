//! OAuth 1.0 PLAINTEXT signing for the Launchpad web service

use chrono::Utc;
use uuid::Uuid;

/// An access token pair issued to a consumer
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub token: String,
    pub token_secret: String,
}

impl OAuthCredentials {
    /// `Authorization` header value for one request
    pub fn authorization(&self) -> String {
        self.authorization_at(Utc::now().timestamp(), &Uuid::new_v4().simple().to_string())
    }

    fn authorization_at(&self, timestamp: i64, nonce: &str) -> String {
        // PLAINTEXT signature is "<consumer secret>&<token secret>"; the
        // consumer secret is always empty for Launchpad
        let signature = format!("&{}", self.token_secret);
        format!(
            "OAuth realm=\"https://api.launchpad.net/\", \
             oauth_consumer_key=\"{}\", \
             oauth_token=\"{}\", \
             oauth_signature_method=\"PLAINTEXT\", \
             oauth_signature=\"{}\", \
             oauth_timestamp=\"{}\", \
             oauth_nonce=\"{}\", \
             oauth_version=\"1.0\"",
            percent_encode(&self.consumer_key),
            percent_encode(&self.token),
            percent_encode(&signature),
            timestamp,
            percent_encode(nonce),
        )
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// RFC 3986 percent-encoding as OAuth 1.0 requires
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
