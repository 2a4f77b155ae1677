// ABOUTME: Blocking HTTP client for the GitHub contents API
// ABOUTME: Handles auth headers, 404-as-absent lookups, and fail-fast errors

use crate::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteContents {
    /// Revision marker required by the API to authorize an overwrite.
    pub sha: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitPayload {
    pub message: String,
    pub content: String,
    pub branch: String,
    /// Must be absent for creates: the API distinguishes a missing field
    /// from null when deciding between create and update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

pub struct GithubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(GithubClient {
            client,
            base_url: base_url.unwrap_or_else(|| "https://api.github.com".into()),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, endpoint))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "ferry/0.1 (Rust)")
    }

    /// Looks up the stored object at the target path. 404 means absent.
    pub fn get_contents(&self, repo: &str, name: &str) -> Result<Option<RemoteContents>> {
        let endpoint = format!("/repos/{}/contents/{}", repo, name);
        let response = self.request(reqwest::Method::GET, &endpoint).send()?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint,
                status: status.as_u16(),
                message,
            });
        }

        let contents: RemoteContents = serde_json::from_str(&response.text()?)?;
        Ok(Some(contents))
    }

    /// Fetches the stored bytes behind a download URL. No auth header: the
    /// URL is pre-authorized by the contents lookup.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                endpoint: url.into(),
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    /// PUTs a commit payload. 200 and 201 both mean success; anything else
    /// surfaces the remote error body verbatim.
    pub fn put_contents(&self, repo: &str, name: &str, payload: &CommitPayload) -> Result<()> {
        let endpoint = format!("/repos/{}/contents/{}", repo, name);
        let response = self
            .request(reqwest::Method::PUT, &endpoint)
            .json(payload)
            .send()?;

        let status = response.status();
        match status.as_u16() {
            200 | 201 => Ok(()),
            code => Err(Error::Api {
                endpoint,
                status: code,
                message: response.text().unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_default_base() {
        let client = GithubClient::new("t0k3n".into(), None).unwrap();
        assert_eq!(client.base_url, "https://api.github.com");
        assert_eq!(client.token, "t0k3n");
    }

    #[test]
    fn test_payload_omits_sha_when_absent() {
        let payload = CommitPayload {
            message: "Upload data.csv".into(),
            content: "aGVsbG8=".into(),
            branch: "main".into(),
            sha: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["content"], "aGVsbG8=");
    }

    #[test]
    fn test_payload_includes_sha_when_present() {
        let payload = CommitPayload {
            message: "Upload data.csv".into(),
            content: "aGVsbG8=".into(),
            branch: "main".into(),
            sha: Some("abc123".into()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["sha"], "abc123");
    }
}
