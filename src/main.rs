// ABOUTME: CLI entrypoint for the ferry command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use ferry::{
    auth::CredentialProvider,
    cli::{Cli, Commands},
    config::Config,
    drive::DriveClient,
    fetch::Fetcher,
    github::GithubClient,
    sync::{sync_file, SyncOutcome},
    Error, Result,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("ferry: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;

    match cli.command() {
        Commands::Run => {
            if config.github.is_none() && config.drive_folder.is_none() {
                return Err(Error::Config(
                    "no destination configured; set GITHUB_REPO and/or DRIVE_FOLDER_ID".into(),
                ));
            }

            let path = fetch(&config)?;

            if let Some(github) = &config.github {
                let client = GithubClient::new(github.token.clone(), Some(github.api_base.clone()))?;
                match sync_file(&client, github, &path)? {
                    SyncOutcome::UpToDate => {
                        println!("{} already up to date in {}", path.display(), github.repo)
                    }
                    SyncOutcome::Uploaded => {
                        println!("Uploaded {} to {}", path.display(), github.repo)
                    }
                }
            }

            if let Some(folder_id) = &config.drive_folder {
                let oauth = config.oauth.clone().ok_or_else(|| {
                    Error::Config("OAuth client credentials missing for Drive upload".into())
                })?;
                let provider = CredentialProvider::new(oauth, config.credentials_path.clone())?;
                let token = provider.access_token()?;

                let client = DriveClient::new(
                    token,
                    Some(config.drive_api_base.clone()),
                    Some(config.drive_upload_base.clone()),
                )?;
                let file = client.upload(folder_id, &path)?;
                println!("Mirrored {} to Drive (file id {})", path.display(), file.id);
            }
        }
        Commands::Fetch => {
            let path = fetch(&config)?;
            println!("Downloaded to {}", path.display());
        }
        Commands::Login => {
            let oauth = config.oauth.clone().ok_or_else(|| {
                Error::Config("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set".into())
            })?;
            let provider = CredentialProvider::new(oauth, config.credentials_path.clone())?;
            provider.authorize_interactive()?;
            println!("Credentials saved to {}", config.credentials_path.display());
        }
    }

    Ok(())
}

fn fetch(config: &Config) -> Result<std::path::PathBuf> {
    let file_id = config.require_file_id()?;
    let fetcher = Fetcher::new(Some(config.download_base.clone()))?;
    fetcher.fetch(file_id, &config.out_dir)
}
