// ABOUTME: Explicit configuration object built once at startup
// ABOUTME: Merges CLI flags over environment variables, validates presence up front

use crate::{cli::Cli, Error, Result};
use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
}

/// Everything the pipeline needs, resolved before any network call.
/// Business logic never reads the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub file_id: Option<String>,
    pub out_dir: PathBuf,
    pub download_base: String,
    pub credentials_path: PathBuf,
    pub github: Option<GithubConfig>,
    pub oauth: Option<OauthConfig>,
    pub drive_folder: Option<String>,
    pub drive_api_base: String,
    pub drive_upload_base: String,
}

fn setting(flag: Option<&str>, var: &str) -> Option<String> {
    flag.map(str::to_string).or_else(|| env::var(var).ok())
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let github = match setting(cli.repo.as_deref(), "GITHUB_REPO") {
            Some(repo) => {
                let token = setting(cli.token.as_deref(), "GITHUB_TOKEN").ok_or_else(|| {
                    Error::Config(
                        "GITHUB_TOKEN must be set when a GitHub repository is configured".into(),
                    )
                })?;
                Some(GithubConfig {
                    token,
                    repo,
                    branch: setting(cli.branch.as_deref(), "GITHUB_BRANCH")
                        .unwrap_or_else(|| "main".into()),
                    api_base: cli.github_api.clone(),
                })
            }
            None => None,
        };

        let oauth = match (
            env::var("GOOGLE_CLIENT_ID").ok(),
            env::var("GOOGLE_CLIENT_SECRET").ok(),
        ) {
            (Some(client_id), Some(client_secret)) => Some(OauthConfig {
                client_id,
                client_secret,
                auth_url: cli.auth_url.clone(),
                token_url: cli.token_url.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(Error::Config(
                    "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together".into(),
                ))
            }
        };

        let drive_folder = setting(cli.folder_id.as_deref(), "DRIVE_FOLDER_ID");
        if drive_folder.is_some() && oauth.is_none() {
            return Err(Error::Config(
                "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set when a Drive folder is configured".into(),
            ));
        }

        let out_dir = match &cli.out_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        Ok(Config {
            file_id: setting(cli.file_id.as_deref(), "DRIVE_FILE_ID"),
            out_dir,
            download_base: cli.download_base.clone(),
            credentials_path: resolve_credentials_path(cli.credentials.clone())?,
            github,
            oauth,
            drive_folder,
            drive_api_base: cli.drive_api.clone(),
            drive_upload_base: cli.drive_upload.clone(),
        })
    }

    pub fn require_file_id(&self) -> Result<&str> {
        self.file_id
            .as_deref()
            .ok_or_else(|| Error::Config("DRIVE_FILE_ID must be set".into()))
    }
}

fn resolve_credentials_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    if let Ok(path) = env::var("FERRY_CREDENTIALS") {
        return Ok(PathBuf::from(path));
    }

    let dirs = ProjectDirs::from("", "", "ferry").ok_or_else(|| {
        Error::Filesystem(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().join("credentials.json"))
}
