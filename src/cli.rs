// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(about = "Mirror a Google Drive file into GitHub and/or a Drive folder", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// GitHub token (overrides GITHUB_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// GitHub repository as owner/name (overrides GITHUB_REPO)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Target branch (overrides GITHUB_BRANCH)
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Drive file identifier to fetch (overrides DRIVE_FILE_ID)
    #[arg(long, global = true)]
    pub file_id: Option<String>,

    /// Drive folder identifier to mirror into (overrides DRIVE_FOLDER_ID)
    #[arg(long, global = true)]
    pub folder_id: Option<String>,

    /// Directory the downloaded file is written to (default: working directory)
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    /// Credential file path (overrides FERRY_CREDENTIALS)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Direct-download base URL
    #[arg(long, global = true, default_value = "https://drive.google.com")]
    pub download_base: String,

    /// GitHub API base URL
    #[arg(long, global = true, default_value = "https://api.github.com")]
    pub github_api: String,

    /// Drive API base URL
    #[arg(long, global = true, default_value = "https://www.googleapis.com/drive/v3")]
    pub drive_api: String,

    /// Drive upload base URL
    #[arg(long, global = true, default_value = "https://www.googleapis.com/upload/drive/v3")]
    pub drive_upload: String,

    /// OAuth authorization endpoint
    #[arg(
        long,
        global = true,
        default_value = "https://accounts.google.com/o/oauth2/v2/auth"
    )]
    pub auth_url: String,

    /// OAuth token endpoint
    #[arg(long, global = true, default_value = "https://oauth2.googleapis.com/token")]
    pub token_url: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch the file and push it to every configured destination (default)
    Run,

    /// Download the file only
    Fetch,

    /// Run the interactive authorization flow and persist credentials
    Login,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["ferry"]);
        assert!(matches!(cli.command(), Commands::Run));
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::parse_from([
            "ferry",
            "run",
            "--repo",
            "octo/data",
            "--branch",
            "main",
            "--file-id",
            "abc123",
        ]);
        assert_eq!(cli.repo.as_deref(), Some("octo/data"));
        assert_eq!(cli.branch.as_deref(), Some("main"));
        assert_eq!(cli.file_id.as_deref(), Some("abc123"));
        assert_eq!(cli.github_api, "https://api.github.com");
    }
}
