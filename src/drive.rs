// ABOUTME: Google Drive v3 uploader with find-or-create semantics
// ABOUTME: Resumable transfers; always sends bytes, no hash short-circuit

use crate::{Error, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct DriveClient {
    client: Client,
    api_base: String,
    upload_base: String,
    token: String,
}

impl DriveClient {
    pub fn new(
        token: String,
        api_base: Option<String>,
        upload_base: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(DriveClient {
            client,
            api_base: api_base.unwrap_or_else(|| "https://www.googleapis.com/drive/v3".into()),
            upload_base: upload_base
                .unwrap_or_else(|| "https://www.googleapis.com/upload/drive/v3".into()),
            token,
        })
    }

    /// Exact-name listing scoped to one parent folder, trashed excluded.
    pub fn find_in_folder(&self, folder_id: &str, name: &str) -> Result<Vec<DriveFile>> {
        let query = format!(
            "name='{}' and '{}' in parents and trashed=false",
            name.replace('\'', "\\'"),
            folder_id
        );

        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .bearer_auth(&self.token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                endpoint: "/files".into(),
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let list: FileList = serde_json::from_str(&response.text()?)?;
        Ok(list.files)
    }

    /// Mirrors `path` into the folder: update in place when exactly one
    /// object matches by name, create otherwise. Bytes are always
    /// transmitted, even when unchanged.
    pub fn upload(&self, folder_id: &str, path: &Path) -> Result<DriveFile> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Config(format!("invalid file name: {}", path.display())))?;
        let bytes = fs::read(path)?;

        let matches = self.find_in_folder(folder_id, name)?;
        match matches.as_slice() {
            [existing] => self.update_resumable(&existing.id, &bytes),
            _ => self.create_resumable(folder_id, name, &bytes),
        }
    }

    fn create_resumable(&self, folder_id: &str, name: &str, bytes: &[u8]) -> Result<DriveFile> {
        let endpoint = format!("{}/files?uploadType=resumable", self.upload_base);
        let metadata = json!({ "name": name, "parents": [folder_id] });

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(&metadata)
            .send()?;

        let session = session_uri(response, "/files")?;
        self.put_session(&session, bytes)
    }

    fn update_resumable(&self, file_id: &str, bytes: &[u8]) -> Result<DriveFile> {
        let endpoint = format!("{}/files/{}?uploadType=resumable", self.upload_base, file_id);

        let response = self
            .client
            .patch(&endpoint)
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()?;

        let session = session_uri(response, "/files/{id}")?;
        self.put_session(&session, bytes)
    }

    fn put_session(&self, session: &str, bytes: &[u8]) -> Result<DriveFile> {
        let response = self
            .client
            .put(session)
            .bearer_auth(&self.token)
            .body(bytes.to_vec())
            .send()?;

        let status = response.status();
        match status.as_u16() {
            200 | 201 => {
                let file: DriveFile = serde_json::from_str(&response.text()?)?;
                Ok(file)
            }
            code => Err(Error::Api {
                endpoint: session.into(),
                status: code,
                message: response.text().unwrap_or_default(),
            }),
        }
    }
}

/// Resumable initiation answers with the session URI in the Location header.
fn session_uri(response: reqwest::blocking::Response, endpoint: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Api {
            endpoint: endpoint.into(),
            status: status.as_u16(),
            message: response.text().unwrap_or_default(),
        });
    }

    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| Error::Api {
            endpoint: endpoint.into(),
            status: status.as_u16(),
            message: "resumable initiation returned no session URI".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_default_bases() {
        let client = DriveClient::new("t0k3n".into(), None, None).unwrap();
        assert_eq!(client.api_base, "https://www.googleapis.com/drive/v3");
        assert_eq!(
            client.upload_base,
            "https://www.googleapis.com/upload/drive/v3"
        );
    }

    #[test]
    fn test_file_list_tolerates_missing_files_key() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }

    #[test]
    fn test_file_list_parses_matches() {
        let list: FileList =
            serde_json::from_str(r#"{"files":[{"id":"f1","name":"data.csv"}]}"#).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.files[0].id, "f1");
    }
}
