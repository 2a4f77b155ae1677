// ABOUTME: OAuth credential provider with persisted token file
// ABOUTME: Valid tokens pass through, expired ones refresh, anything else runs the browser flow

use crate::{config::OauthConfig, Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    fn from_response(response: TokenResponse, prior_refresh: Option<String>) -> Self {
        Credentials {
            access_token: response.access_token,
            // The token endpoint may omit the refresh token on renewal;
            // the previously issued one stays valid.
            refresh_token: response.refresh_token.or(prior_refresh),
            expires_at: Utc::now() + ChronoDuration::seconds(response.expires_in),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug)]
enum CredentialState {
    Valid(Credentials),
    Refresh(Credentials),
    Interactive,
}

/// A missing or corrupt credential file is not an error, just a state.
fn classify(creds: Option<Credentials>) -> CredentialState {
    match creds {
        Some(creds) if !creds.is_expired() => CredentialState::Valid(creds),
        Some(creds) if creds.refresh_token.is_some() => CredentialState::Refresh(creds),
        _ => CredentialState::Interactive,
    }
}

pub fn load_credentials(path: &Path) -> Option<Credentials> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn store_credentials(path: &Path, creds: &Credentials) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(creds)?)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

pub struct CredentialProvider {
    client: Client,
    config: OauthConfig,
    path: PathBuf,
}

impl CredentialProvider {
    pub fn new(config: OauthConfig, path: PathBuf) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(CredentialProvider {
            client,
            config,
            path,
        })
    }

    /// Returns a usable access token, refreshing or re-authorizing as
    /// needed. Every path that mints new tokens persists them.
    pub fn access_token(&self) -> Result<String> {
        match classify(load_credentials(&self.path)) {
            CredentialState::Valid(creds) => Ok(creds.access_token),
            CredentialState::Refresh(creds) => {
                let refresh_token = creds.refresh_token.as_deref().unwrap_or_default();
                let fresh = self.refresh(refresh_token)?;
                store_credentials(&self.path, &fresh)?;
                Ok(fresh.access_token)
            }
            CredentialState::Interactive => {
                let creds = self.authorize_interactive()?;
                Ok(creds.access_token)
            }
        }
    }

    fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ];
        let response = self.token_request(&params)?;
        Ok(Credentials::from_response(
            response,
            Some(refresh_token.to_string()),
        ))
    }

    fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Credentials> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ];
        let response = self.token_request(&params)?;
        Ok(Credentials::from_response(response, None))
    }

    fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(response.json()?)
    }

    /// Full browser round trip: loopback listener, authorization URL,
    /// callback code, token exchange, persist.
    pub fn authorize_interactive(&self) -> Result<Credentials> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let state = random_state();
        let auth_url = self.build_auth_url(&redirect_uri, &state)?;

        println!("Opening browser for authorization...");
        if open::that(auth_url.as_str()).is_err() {
            println!("Open this URL manually: {}", auth_url);
        }

        let (code, returned_state) = wait_for_callback(&listener)?;
        if returned_state.as_deref() != Some(state.as_str()) {
            return Err(Error::Auth("authorization state mismatch".into()));
        }

        let creds = self.exchange_code(&code, &redirect_uri)?;
        store_credentials(&self.path, &creds)?;
        Ok(creds)
    }

    fn build_auth_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| Error::Auth(format!("invalid authorization endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", DRIVE_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("state", state);
        Ok(url)
    }
}

fn random_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn wait_for_callback(listener: &TcpListener) -> Result<(String, Option<String>)> {
    let (mut stream, _) = listener.accept()?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // "GET /callback?code=...&state=... HTTP/1.1"
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::Auth("malformed callback request".into()))?;
    let url = Url::parse(&format!("http://localhost{}", target))
        .map_err(|_| Error::Auth("malformed callback request".into()))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    let body = "Authorization complete. You can close this tab.";
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;

    let code = code.ok_or_else(|| Error::Auth("callback carried no authorization code".into()))?;
    Ok((code, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn creds(expired: bool, refresh: Option<&str>) -> Credentials {
        let offset = if expired { -60 } else { 3600 };
        Credentials {
            access_token: "t0k3n".into(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Utc::now() + ChronoDuration::seconds(offset),
        }
    }

    #[test]
    fn test_classify_missing_is_interactive() {
        assert!(matches!(classify(None), CredentialState::Interactive));
    }

    #[test]
    fn test_classify_valid_passes_through() {
        assert!(matches!(
            classify(Some(creds(false, None))),
            CredentialState::Valid(_)
        ));
    }

    #[test]
    fn test_classify_expired_with_refresh() {
        assert!(matches!(
            classify(Some(creds(true, Some("r3fr3sh")))),
            CredentialState::Refresh(_)
        ));
    }

    #[test]
    fn test_classify_expired_without_refresh_is_interactive() {
        assert!(matches!(
            classify(Some(creds(true, None))),
            CredentialState::Interactive
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(load_credentials(&temp.path().join("missing.json")).is_none());
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        fs::write(&path, "not json {").unwrap();
        assert!(load_credentials(&path).is_none());
    }

    #[test]
    fn test_store_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("credentials.json");

        let original = creds(false, Some("r3fr3sh"));
        store_credentials(&path, &original).unwrap();

        let loaded = load_credentials(&path).unwrap();
        assert_eq!(loaded.access_token, "t0k3n");
        assert_eq!(loaded.refresh_token.as_deref(), Some("r3fr3sh"));
    }

    #[test]
    #[cfg(unix)]
    fn test_store_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        store_credentials(&path, &creds(false, None)).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn test_renewal_keeps_prior_refresh_token() {
        let response = TokenResponse {
            access_token: "fresh".into(),
            refresh_token: None,
            expires_in: 3600,
        };
        let renewed = Credentials::from_response(response, Some("r3fr3sh".into()));
        assert_eq!(renewed.access_token, "fresh");
        assert_eq!(renewed.refresh_token.as_deref(), Some("r3fr3sh"));
        assert!(!renewed.is_expired());
    }
}
