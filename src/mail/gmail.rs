use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{MailError, MailResult, Mailbox};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_MS: u64 = 60_000;

/// Gmail sends base64url, sometimes padded, sometimes not.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Where a previously authorized token is stored by default.
pub fn default_token_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".credentials").join("gmail-nodejs-quickstart.json"))
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: ClientSecret,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
}

/// OAuth credentials as saved after the consent flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub expiry_date: Option<u64>,
}

impl StoredToken {
    fn needs_refresh(&self, now_ms: u64) -> bool {
        self.expiry_date
            .is_some_and(|expiry| expiry <= now_ms + EXPIRY_MARGIN_MS)
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    parts: Vec<Part>,
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    data: Option<String>,
}

/// A Gmail inbox accessed through the REST API with a stored OAuth token.
pub struct GmailMailbox {
    http: reqwest::Client,
    client: ClientSecret,
    token: Mutex<StoredToken>,
}

impl GmailMailbox {
    /// Load the installed-app client secret and a previously stored token.
    pub fn from_files(secret_path: &Path, token_path: &Path) -> MailResult<Self> {
        let secret: ClientSecretFile = serde_json::from_str(&read(secret_path)?)?;
        let token: StoredToken = serde_json::from_str(&read(token_path)?)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            client: secret.installed,
            token: Mutex::new(token),
        })
    }

    async fn access_token(&self) -> MailResult<String> {
        let mut token = self.token.lock().await;
        if !token.needs_refresh(now_ms()) {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            MailError::Auth("access token expired and no refresh token is stored".into())
        })?;

        tracing::debug!("Refreshing Gmail access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client.client_id.as_str()),
                ("client_secret", self.client.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Auth(format!("token refresh failed ({}): {}", status, body)));
        }

        let refreshed: RefreshResponse = response.json().await?;
        token.access_token = refreshed.access_token;
        token.expiry_date = refreshed
            .expires_in
            .map(|secs| now_ms() + secs * 1000);
        Ok(token.access_token.clone())
    }
}

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn list_ids(&self) -> MailResult<Vec<String>> {
        let token = self.access_token().await?;
        let list: MessageList = self
            .http
            .get(MESSAGES_URL)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn read_body(&self, id: &str) -> MailResult<String> {
        let token = self.access_token().await?;
        let message: Message = self
            .http
            .get(format!("{}/{}", MESSAGES_URL, id))
            .query(&[("format", "full")])
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        message_body(id, &message)
    }

    async fn delete(&self, id: &str) -> MailResult<()> {
        let token = self.access_token().await?;
        self.http
            .delete(format!("{}/{}", MESSAGES_URL, id))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn read(path: &Path) -> MailResult<String> {
    std::fs::read_to_string(path).map_err(|source| MailError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Text of the first MIME part, or of the payload itself for single-part mail.
fn message_body(id: &str, message: &Message) -> MailResult<String> {
    let data = match message.payload.parts.first() {
        Some(part) => part.body.as_ref().and_then(|b| b.data.as_deref()),
        None => message.payload.body.as_ref().and_then(|b| b.data.as_deref()),
    };
    let data = data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| MailError::UnsupportedMessage(id.to_string()))?;

    let bytes = BODY_ENGINE.decode(data.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
