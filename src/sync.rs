// ABOUTME: Content-addressed conditional upload to the GitHub contents API
// ABOUTME: Skips the commit entirely when local and remote hashes match

use crate::{
    config::GithubConfig,
    github::{CommitPayload, GithubClient},
    Error, Result,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;

/// Structured outcome so the caller decides presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Uploaded,
    UpToDate,
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Upload `path` to the repository unless the stored copy already has the
/// same content hash. When the object exists, its revision marker is carried
/// into the commit payload so the API performs an update instead of
/// rejecting a blind create.
pub fn sync_file(client: &GithubClient, config: &GithubConfig, path: &Path) -> Result<SyncOutcome> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Config(format!("invalid file name: {}", path.display())))?;

    let local = fs::read(path)?;
    let local_hash = sha1_hex(&local);

    let remote = client.get_contents(&config.repo, name)?;
    let (remote_sha, remote_hash) = match &remote {
        Some(contents) => {
            let stored = client.download(&contents.download_url)?;
            (Some(contents.sha.clone()), Some(sha1_hex(&stored)))
        }
        None => (None, None),
    };

    if remote_hash.as_deref() == Some(local_hash.as_str()) {
        return Ok(SyncOutcome::UpToDate);
    }

    let payload = CommitPayload {
        message: format!("Upload {}", name),
        content: STANDARD.encode(&local),
        branch: config.branch.clone(),
        sha: remote_sha,
    };
    client.put_contents(&config.repo, name, &payload)?;

    Ok(SyncOutcome::Uploaded)
}
