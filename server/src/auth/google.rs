use async_trait::async_trait;
use histoury_lib::user::GoogleProfile;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::services::ServiceError;

const TOKEN_INFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// The OAuth authorization code flow against an OpenID provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, ServiceError>;

    /// Redeems `code` and returns the verified identity behind it.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleProfile, ServiceError>;
}

#[derive(Debug, Clone, Deserialize)]
struct Discovery {
    authorization_endpoint: String,
    token_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    /// Google has sent this both as a bool and as a string.
    email_verified: Option<Value>,
    name: Option<String>,
    picture: Option<String>,
}

pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    discovery_url: String,
    discovery: OnceCell<Discovery>,
}

impl GoogleIdentityProvider {
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String, discovery_url: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            discovery_url,
            discovery: OnceCell::new(),
        }
    }

    async fn discovery(&self) -> Result<&Discovery, ServiceError> {
        self.discovery.get_or_try_init(|| async {
            tracing::debug!("Fetching OpenID discovery document from {}", self.discovery_url);
            let discovery = self.http
                .get(&self.discovery_url)
                .send()
                .await?
                .error_for_status()?
                .json::<Discovery>()
                .await?;
            Ok::<_, ServiceError>(discovery)
        }).await
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, ServiceError> {
        if self.client_id.is_empty() {
            return Err(ServiceError::NotConfigured("Google sign-in"));
        }

        let discovery = self.discovery().await?;
        let url = Url::parse_with_params(&discovery.authorization_endpoint, &[
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ]).map_err(|err| ServiceError::Upstream(format!("Bad authorization endpoint: {err}")))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleProfile, ServiceError> {
        let discovery = self.discovery().await?;

        let tokens: TokenResponse = self.http
            .post(&discovery.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: TokenInfo = self.http
            .get(TOKEN_INFO_ENDPOINT)
            .query(&[("id_token", tokens.id_token.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        verified_profile(info, &self.client_id)
    }
}

fn verified_profile(info: TokenInfo, client_id: &str) -> Result<GoogleProfile, ServiceError> {
    if info.aud != client_id {
        return Err(ServiceError::Upstream("ID token was issued for another client".to_string()));
    }

    let verified = match info.email_verified {
        Some(Value::Bool(verified)) => verified,
        Some(Value::String(verified)) => verified == "true",
        _ => false,
    };

    let email = match info.email {
        Some(email) if verified => email,
        _ => return Err(ServiceError::Upstream("User email not available or not verified".to_string())),
    };

    Ok(GoogleProfile {
        google_id: info.sub,
        display_name: info.name.unwrap_or_else(|| email.clone()),
        email,
        profile_picture_url: info.picture.unwrap_or_default(),
    })
}
