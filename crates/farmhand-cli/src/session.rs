//! Session storage and client construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use farmhand_core::{ApiUrl, ClientConfig, Session};
use farmhand_file::FileStore;
use farmhand_http::{FarmClient, SessionEvent};

use crate::cli::ConnectionArgs;
use crate::output;

/// Resolve the session file path.
fn session_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let dirs =
        ProjectDirs::from("", "", "farmhand").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("session.json"))
}

/// Build a client whose session is backed by the session file.
pub async fn connect(args: &ConnectionArgs) -> Result<FarmClient> {
    let path = session_path(args.session_file.as_deref())?;
    debug!(path = %path.display(), "Using session file");

    let store = Arc::new(FileStore::new(&path));
    let session = Session::restore(store)
        .await
        .context("Failed to load session")?;

    let base_url = ApiUrl::new(&args.api_url).context("Invalid API URL")?;
    let config = ClientConfig::new(base_url)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_user_agent(format!("farmhand/{}", env!("FARMHAND_VERSION")));

    FarmClient::new(config, session).context("Failed to create client")
}

/// Fail unless a login is stored.
pub async fn require_login(client: &FarmClient) -> Result<()> {
    if client.session().is_authenticated().await {
        Ok(())
    } else {
        anyhow::bail!("No active session. Run 'farmhand login' first.")
    }
}

/// Tell the user about session changes that happened during the command.
pub fn report_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Expired) => {
                output::error("Session expired. Run 'farmhand login' to sign in again.");
            }
            Ok(event) => debug!(?event, "Session event"),
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "Missed session events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_session_path_wins() {
        let path = session_path(Some(Path::new("/tmp/farmhand/session.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/farmhand/session.json"));
    }
}
