// Async driver around SearchState: debounce timer, fetch tasks, snapshots
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::{
    models::{QueryParams, ResultPage, SearchPage},
    search::SearchProvider,
    search_state::{FetchTicket, SearchState, Transition},
    Result,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub debounce: Duration,
    pub per_page: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            per_page: crate::pagination::DEFAULT_PER_PAGE,
        }
    }
}

/// Handle to a running search controller.
///
/// Feed it the form state with [`update`](Self::update); read results with
/// [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe). Dropping
/// the handle stops the controller, including any debounce still pending.
pub struct SearchController {
    updates: mpsc::UnboundedSender<QueryParams>,
    snapshots: watch::Receiver<ResultPage>,
    task: JoinHandle<()>,
}

impl SearchController {
    /// Start the controller task. Must be called inside a tokio runtime.
    pub fn spawn(provider: Arc<dyn SearchProvider>, settings: ControllerSettings) -> Self {
        let (updates, inbox) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(ResultPage::default());
        let task = tokio::spawn(run(provider, settings, inbox, publisher));

        Self {
            updates,
            snapshots,
            task,
        }
    }

    pub fn update(&self, params: QueryParams) {
        if self.updates.send(params).is_err() {
            debug!("Search controller already stopped");
        }
    }

    pub fn snapshot(&self) -> ResultPage {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultPage> {
        self.snapshots.clone()
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    provider: Arc<dyn SearchProvider>,
    settings: ControllerSettings,
    mut inbox: mpsc::UnboundedReceiver<QueryParams>,
    publisher: watch::Sender<ResultPage>,
) {
    let mut state = SearchState::new(settings.per_page);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, Result<SearchPage>)>();
    let mut scheduled: Option<(Instant, FetchTicket)> = None;

    loop {
        let deadline = scheduled.as_ref().map(|(at, _)| *at);

        tokio::select! {
            update = inbox.recv() => {
                let Some(params) = update else {
                    debug!("Search controller input closed");
                    break;
                };

                let changed = match state.update(params) {
                    Transition::Unchanged => false,
                    Transition::Cancel => {
                        scheduled = None;
                        true
                    }
                    Transition::Debounce(ticket) => {
                        scheduled = Some((Instant::now() + settings.debounce, ticket));
                        true
                    }
                    Transition::FetchNow(ticket) => {
                        scheduled = None;
                        dispatch(&provider, ticket, &done_tx);
                        true
                    }
                };

                if changed {
                    publisher.send_replace(state.snapshot().clone());
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some((_, ticket)) = scheduled.take() {
                    dispatch(&provider, ticket, &done_tx);
                }
            }
            Some((generation, result)) = done_rx.recv() => {
                if state.complete(generation, result) {
                    publisher.send_replace(state.snapshot().clone());
                }
            }
        }
    }
}

/// Fire a fetch in its own task. Superseded fetches are left to finish;
/// the state machine drops their results.
fn dispatch(
    provider: &Arc<dyn SearchProvider>,
    ticket: FetchTicket,
    done: &mpsc::UnboundedSender<(u64, Result<SearchPage>)>,
) {
    info!(
        generation = ticket.generation,
        page = ticket.request.page,
        query = %ticket.request.query,
        "Fetching repositories"
    );

    let provider = Arc::clone(provider);
    let done = done.clone();
    tokio::spawn(async move {
        let result = provider.search(&ticket.request).await;
        let _ = done.send((ticket.generation, result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RepositorySummary, SearchRequest};
    use crate::search::MockSearchProvider;
    use crate::Error;
    use std::sync::Mutex;
    use tokio::time::sleep;

    /// Answers every request with two repositories derived from the
    /// request, after a per-term delay.
    struct FakeProvider {
        calls: Mutex<Vec<SearchRequest>>,
        delay: fn(&SearchRequest) -> Duration,
        fail: bool,
    }

    impl FakeProvider {
        fn new(delay: fn(&SearchRequest) -> Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                delay,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                delay: |_| Duration::from_millis(50),
                fail: true,
            })
        }

        fn calls(&self) -> Vec<SearchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl SearchProvider for FakeProvider {
        async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
            self.calls.lock().unwrap().push(request.clone());
            sleep((self.delay)(request)).await;

            if self.fail {
                return Err(Error::ApiError("HTTP status 503 Service Unavailable".into()));
            }

            let term = request.query.split_whitespace().next().unwrap_or_default();
            let items = (0..2)
                .map(|i| RepositorySummary {
                    id: u64::from(request.page) * 100 + i,
                    full_name: format!("{}/p{}-{}", term, request.page, i),
                    ..RepositorySummary::default()
                })
                .collect();
            Ok(SearchPage {
                items,
                total_count: 90,
            })
        }
    }

    fn quick(_: &SearchRequest) -> Duration {
        Duration::from_millis(100)
    }

    fn params(term: &str, page: u32) -> QueryParams {
        QueryParams {
            search_term: term.to_string(),
            page,
            ..QueryParams::default()
        }
    }

    fn names(page: &ResultPage) -> Vec<String> {
        page.repositories.iter().map(|r| r.full_name.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_term_never_hits_the_network() {
        let mut provider = MockSearchProvider::new();
        provider.expect_search().times(0);

        let controller = SearchController::spawn(Arc::new(provider), ControllerSettings::default());
        controller.update(params("   ", 1));
        sleep(Duration::from_secs(2)).await;

        assert_eq!(controller.snapshot(), ResultPage::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_inside_debounce_window_fires_once_with_latest_term() {
        let provider = FakeProvider::new(quick);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings::default());

        controller.update(params("r", 1));
        sleep(Duration::from_millis(200)).await;
        controller.update(params("ru", 1));
        sleep(Duration::from_millis(200)).await;
        controller.update(params("rust", 1));
        sleep(Duration::from_millis(400)).await;
        assert!(provider.calls().is_empty(), "fired before the window closed");

        sleep(Duration::from_secs(1)).await;
        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].query.starts_with("rust created:"));
        assert_eq!(names(&controller.snapshot()), vec!["rust/p1-0", "rust/p1-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_is_immediate_and_appends() {
        let provider = FakeProvider::new(quick);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings::default());

        controller.update(params("rust", 1));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.snapshot().total_count, 90);

        controller.update(params("rust", 2));
        // well under the debounce delay
        sleep(Duration::from_millis(150)).await;

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_loading);
        assert_eq!(
            names(&snapshot),
            vec!["rust/p1-0", "rust/p1-1", "rust/p2-0", "rust/p2-1"]
        );
        assert_eq!(provider.calls().len(), 2);
        assert_eq!(provider.calls()[1].page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_term_clears_results_before_fetching() {
        let provider = FakeProvider::new(quick);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings::default());
        let mut snapshots = controller.subscribe();

        controller.update(params("rust", 1));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.snapshot().repositories.len(), 2);

        snapshots.borrow_and_update();
        controller.update(params("tokio", 1));
        snapshots.changed().await.unwrap();
        {
            let pending = snapshots.borrow_and_update();
            assert!(pending.repositories.is_empty());
            assert!(pending.is_loading);
        }

        sleep(Duration::from_secs(1)).await;
        assert_eq!(names(&controller.snapshot()), vec!["tokio/p1-0", "tokio/p1-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_surfaces_message() {
        let controller = SearchController::spawn(FakeProvider::failing(), ControllerSettings::default());

        controller.update(params("rust", 1));
        sleep(Duration::from_secs(1)).await;

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_loading);
        assert!(snapshot.repositories.is_empty());
        assert_eq!(snapshot.total_count, 0);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Failed to fetch repositories: API request failed: HTTP status 503 Service Unavailable")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_does_not_overwrite_newer_search() {
        fn slow_for_old(request: &SearchRequest) -> Duration {
            if request.query.starts_with("old ") {
                Duration::from_secs(3)
            } else {
                Duration::from_millis(100)
            }
        }

        let provider = FakeProvider::new(slow_for_old);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings::default());

        controller.update(params("old", 1));
        sleep(Duration::from_millis(600)).await;
        assert_eq!(provider.calls().len(), 1, "old search should be in flight");

        controller.update(params("new", 1));
        sleep(Duration::from_secs(5)).await;

        assert_eq!(provider.calls().len(), 2);
        assert_eq!(names(&controller.snapshot()), vec!["new/p1-0", "new/p1-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controller_cancels_pending_debounce() {
        let provider = FakeProvider::new(quick);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings::default());

        controller.update(params("rust", 1));
        sleep(Duration::from_millis(100)).await;
        drop(controller);
        sleep(Duration::from_secs(2)).await;

        assert!(provider.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_held_page_does_not_refetch() {
        let provider = FakeProvider::new(quick);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings {
            per_page: 2,
            ..ControllerSettings::default()
        });

        controller.update(params("rust", 1));
        sleep(Duration::from_secs(1)).await;
        controller.update(params("rust", 2));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(controller.snapshot().repositories.len(), 4);

        controller.update(params("rust", 1));
        sleep(Duration::from_secs(1)).await;

        assert_eq!(provider.calls().len(), 2);
        assert_eq!(names(&controller.snapshot()), vec!["rust/p1-0", "rust/p1-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_debounce_is_honoured() {
        let provider = FakeProvider::new(quick);
        let controller = SearchController::spawn(provider.clone(), ControllerSettings {
            debounce: Duration::from_millis(50),
            ..ControllerSettings::default()
        });

        controller.update(params("rust", 1));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(controller.snapshot().repositories.len(), 2);
    }
}
