//! OAuth for the Drive backend: a cached authorized-user token, refreshed
//! when it expires, with an interactive loopback consent only when nothing
//! usable is on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::time;
use url::Url;

use crate::browser::{SystemBrowser, UrlOpener};
use crate::config::DriveSettings;
use crate::constants::{
    GOOGLE_AUTH_URI, GOOGLE_TOKEN_URI, REDIRECT_SHUTDOWN_GRACE, TOKEN_EXPIRY_SKEW_SECS,
};
use crate::error::{AppError, Result};

/// Token cache in the authorized-user layout Google's client libraries write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Usable right now: an access token that is not about to expire.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && !self.is_expired(now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(TOKEN_EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    fn apply(&mut self, response: TokenResponse) {
        self.token = Some(response.access_token);
        self.expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
    }
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ClientSecrets {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Auth(format!("cannot read client secrets {}: {}", path.display(), e))
        })?;
        let file: ClientSecretsFile = serde_json::from_str(&raw)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| {
                AppError::Auth("client secrets contain no installed or web section".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Hands out Drive access tokens, caching them in memory and on disk.
#[derive(Debug)]
pub struct Authenticator {
    http: Client,
    token_file: PathBuf,
    credentials_file: PathBuf,
    scopes: Vec<String>,
    cached: Mutex<Option<StoredToken>>,
}

impl Authenticator {
    pub fn new(http: Client, settings: &DriveSettings) -> Self {
        Self {
            http,
            token_file: settings.token_file.clone(),
            credentials_file: settings.credentials_file.clone(),
            scopes: settings.scopes.clone(),
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.load_token_file().await?;
        }

        let now = Utc::now();
        let token = match cached.take() {
            Some(token) if token.is_valid(now) => token,
            Some(mut token) if token.refresh_token.is_some() => {
                tracing::info!("Refreshing Google Drive access token");
                self.refresh(&mut token).await?;
                self.save_token_file(&token).await?;
                token
            }
            _ => {
                let token = self.consent().await?;
                self.save_token_file(&token).await?;
                token
            }
        };

        let access = token
            .token
            .clone()
            .ok_or_else(|| AppError::Auth("token endpoint returned no access token".to_string()))?;
        *cached = Some(token);
        Ok(access)
    }

    async fn load_token_file(&self) -> Result<Option<StoredToken>> {
        match tokio::fs::read_to_string(&self.token_file).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(token) => Ok(Some(token)),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable token cache {}: {}",
                        self.token_file.display(),
                        e
                    );
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_token_file(&self, token: &StoredToken) -> Result<()> {
        let json = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.token_file, json).await?;
        tracing::debug!("Saved token cache to {}", self.token_file.display());
        Ok(())
    }

    async fn refresh(&self, token: &mut StoredToken) -> Result<()> {
        let refresh_token = token.refresh_token.clone().unwrap_or_default();
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
        ];
        let response = self.request_token(&token.token_uri, &params).await?;
        token.apply(response);
        Ok(())
    }

    /// Installed-app consent over a loopback redirect.
    async fn consent(&self) -> Result<StoredToken> {
        let secrets = ClientSecrets::load(&self.credentials_file).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let redirect_uri = format!("http://localhost:{}/", listener.local_addr()?.port());
        let state = uuid::Uuid::new_v4().simple().to_string();
        let scope = self.scopes.join(" ");

        let auth_url = Url::parse_with_params(
            &secrets.auth_uri,
            [
                ("response_type", "code"),
                ("client_id", secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AppError::Auth(format!("invalid auth_uri {}: {}", secrets.auth_uri, e)))?;

        tracing::info!("Please visit this URL to authorize this application: {}", auth_url);
        if let Err(e) = SystemBrowser::new().open(auth_url.as_str()).await {
            tracing::warn!("Could not open the consent page automatically: {}", e);
        }

        let code = wait_for_redirect(listener, &state).await?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        let response = self.request_token(&secrets.token_uri, &params).await?;

        let mut token = StoredToken {
            token: None,
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            scopes: self.scopes.clone(),
            expiry: None,
        };
        token.apply(response);
        tracing::info!("Google Drive authorization completed");
        Ok(token)
    }

    async fn request_token(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse> {
        let response = self.http.post(token_uri).form(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                service: "Google token endpoint",
                status,
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Clone)]
struct RedirectState {
    params: Arc<StdMutex<Option<oneshot::Sender<HashMap<String, String>>>>>,
}

async fn redirect_handler(
    State(state): State<RedirectState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    if !params.contains_key("code") && !params.contains_key("error") {
        return (StatusCode::NOT_FOUND, "");
    }
    let sender = state.params.lock().ok().and_then(|mut slot| slot.take());
    if let Some(sender) = sender {
        let _ = sender.send(params);
    }
    (
        StatusCode::OK,
        "The authentication flow has completed. You may close this window.",
    )
}

/// Serves the loopback redirect until a request carrying `code` or `error` arrives.
async fn wait_for_redirect(listener: TcpListener, expected_state: &str) -> Result<String> {
    let (params_tx, params_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let state = RedirectState {
        params: Arc::new(StdMutex::new(Some(params_tx))),
    };
    let app = Router::new()
        .route("/", get(redirect_handler))
        .with_state(state);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let params = params_rx
        .await
        .map_err(|_| AppError::Auth("redirect listener stopped before consent".to_string()))?;

    let _ = shutdown_tx.send(());
    if time::timeout(REDIRECT_SHUTDOWN_GRACE, &mut server).await.is_err() {
        tracing::debug!("Redirect listener still had open connections, closing it");
        server.abort();
    }

    code_from_params(&params, expected_state)
}

fn code_from_params(params: &HashMap<String, String>, expected_state: &str) -> Result<String> {
    if let Some(error) = params.get("error") {
        return Err(AppError::Auth(format!("consent was denied: {}", error)));
    }
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(AppError::Auth("state mismatch in OAuth redirect".to_string()));
    }
    params
        .get("code")
        .cloned()
        .ok_or_else(|| AppError::Auth("OAuth redirect carried no code".to_string()))
}
