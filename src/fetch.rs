// ABOUTME: Downloads the remote file by identifier over plain HTTP GET
// ABOUTME: Resolves the local filename from content-disposition with a fixed fallback

use crate::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_DISPOSITION;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_NAME: &str = "data_latest.csv";

pub struct Fetcher {
    client: Client,
    base_url: String,
}

impl Fetcher {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Fetcher {
            client,
            base_url: base_url.unwrap_or_else(|| "https://drive.google.com".into()),
        })
    }

    /// Single attempt, no retry: a failed GET aborts the whole run.
    pub fn fetch(&self, file_id: &str, out_dir: &Path) -> Result<PathBuf> {
        let url = format!("{}/uc?export=download&id={}", self.base_url, file_id);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: "/uc".into(),
                status: status.as_u16(),
                message,
            });
        }

        let name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| DEFAULT_NAME.into());

        let bytes = response.bytes()?;
        let path = out_dir.join(&name);
        fs::write(&path, &bytes)?;

        Ok(path)
    }
}

fn filename_from_disposition(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name = rest.split(';').next().unwrap_or(rest).trim().trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_quoted() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="report.csv""#),
            Some("report.csv".into())
        );
    }

    #[test]
    fn test_filename_unquoted_with_trailing_params() {
        assert_eq!(
            filename_from_disposition("attachment; filename=data.csv; size=42"),
            Some("data.csv".into())
        );
    }

    #[test]
    fn test_filename_absent() {
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_fetcher_default_base() {
        let fetcher = Fetcher::new(None).unwrap();
        assert_eq!(fetcher.base_url, "https://drive.google.com");
    }
}
