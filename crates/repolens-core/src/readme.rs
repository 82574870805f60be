// README viewer state: metadata lookup, then content download
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::search::ReadmeProvider;

#[derive(Error, Debug)]
pub enum ReadmeError {
    #[error("Repository name is required")]
    MissingName,

    #[error("Invalid repository name")]
    InvalidName(String),

    #[error("Unable to fetch README metadata: {0}")]
    Metadata(#[source] crate::Error),

    #[error("README download URL not found")]
    MissingDownloadUrl,

    #[error("Unable to download README content: {0}")]
    Content(#[source] crate::Error),
}

/// Split "owner/repo"
pub fn split_full_name(full_name: &str) -> Result<(&str, &str), ReadmeError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(ReadmeError::MissingName);
    }

    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(ReadmeError::InvalidName(full_name.to_string())),
    }
}

/// Both README steps, each with its own error
pub async fn fetch_readme(
    provider: &dyn ReadmeProvider,
    full_name: &str,
) -> Result<String, ReadmeError> {
    let (owner, repo) = split_full_name(full_name)?;

    let download_url = provider
        .readme_download_url(owner, repo)
        .await
        .map_err(ReadmeError::Metadata)?
        .ok_or(ReadmeError::MissingDownloadUrl)?;

    provider
        .download(&download_url)
        .await
        .map_err(ReadmeError::Content)
}

/// What the README viewer renders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadmeState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub readme: String,
}

enum Command {
    Open(String),
    Refetch,
}

/// Handle to a running README controller. Opening a different repository
/// fetches again; [`refetch`](Self::refetch) repeats the current one.
pub struct ReadmeController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ReadmeState>,
    task: JoinHandle<()>,
}

impl ReadmeController {
    pub fn spawn(provider: Arc<dyn ReadmeProvider>) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (publisher, state) = watch::channel(ReadmeState::default());
        let task = tokio::spawn(run(provider, inbox, publisher));

        Self {
            commands,
            state,
            task,
        }
    }

    pub fn open(&self, full_name: impl Into<String>) {
        self.send(Command::Open(full_name.into()));
    }

    pub fn refetch(&self) {
        self.send(Command::Refetch);
    }

    pub fn snapshot(&self) -> ReadmeState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadmeState> {
        self.state.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("README controller already stopped");
        }
    }
}

impl Drop for ReadmeController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    provider: Arc<dyn ReadmeProvider>,
    mut inbox: mpsc::UnboundedReceiver<Command>,
    publisher: watch::Sender<ReadmeState>,
) {
    let mut current: Option<String> = None;
    let mut generation: u64 = 0;
    let mut state = ReadmeState::default();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, Result<String, ReadmeError>)>();

    loop {
        tokio::select! {
            command = inbox.recv() => {
                let name = match command {
                    None => break,
                    Some(Command::Open(name)) => {
                        if current.as_deref() == Some(name.as_str()) {
                            continue;
                        }
                        state.readme.clear();
                        current = Some(name.clone());
                        name
                    }
                    Some(Command::Refetch) => current.clone().unwrap_or_default(),
                };

                generation += 1;
                state.is_loading = true;
                state.error = None;
                publisher.send_replace(state.clone());

                info!(generation, repository = %name, "Fetching README");
                let provider = Arc::clone(&provider);
                let done = done_tx.clone();
                let issued = generation;
                tokio::spawn(async move {
                    let result = fetch_readme(provider.as_ref(), &name).await;
                    let _ = done.send((issued, result));
                });
            }
            Some((issued, result)) = done_rx.recv() => {
                if issued != generation {
                    debug!(issued, current = generation, "Discarding stale README response");
                    continue;
                }

                match result {
                    Ok(readme) => {
                        state.readme = readme;
                        state.error = None;
                    }
                    Err(err) => {
                        warn!("README fetch failed: {}", err);
                        state.readme.clear();
                        state.error = Some(err.to_string());
                    }
                }
                state.is_loading = false;
                publisher.send_replace(state.clone());
            }
        }
    }
}
