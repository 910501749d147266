//! Feed Controller
//!
//! Async driver around [`FeedState`]: performs requests through a
//! [`MessageSource`], applies the responses and broadcasts what changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use super::state::{FeedSettings, FeedState, Operation, Outcome, Ticket};
use crate::indexer::MessageSource;
use crate::types::FeedRequest;

/// Default interval between new-message probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Notifications emitted after a response is applied
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// List replaced by a first page
    Loaded { count: usize, searching: bool },
    /// Next window appended
    Appended { added: usize },
    /// New messages are waiting
    NewMessages { count: usize },
    /// Announced messages prepended
    Refreshed { added: usize },
    /// A request failed; the list is unchanged
    Failed { operation: Operation, error: String },
}

/// Drives a feed against a message source
pub struct FeedController<S: MessageSource> {
    source: Arc<S>,
    state: Arc<RwLock<FeedState>>,
    events: broadcast::Sender<FeedEvent>,
    poll_interval: Duration,
}

impl<S: MessageSource + 'static> FeedController<S> {
    /// Create a controller with the given settings and poll interval
    pub fn new(source: Arc<S>, settings: FeedSettings, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            source,
            state: Arc::new(RwLock::new(FeedState::new(settings))),
            events,
            poll_interval,
        }
    }

    /// Subscribe to feed events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    /// Copy of the current state for rendering
    pub async fn snapshot(&self) -> FeedState {
        self.state.read().await.clone()
    }

    /// Load the first page of the current view
    pub async fn load(&self) -> Outcome {
        let (ticket, request) = self.state.write().await.reload();
        self.run(ticket, request).await
    }

    /// Submit a search; blank text returns to the latest view
    pub async fn search(&self, text: &str) -> Outcome {
        let (ticket, request) = self.state.write().await.submit_search(text);
        self.run(ticket, request).await
    }

    /// Load the next window; `None` when busy or exhausted
    pub async fn load_more(&self) -> Option<Outcome> {
        let (ticket, request) = self.state.write().await.load_more()?;
        Some(self.run(ticket, request).await)
    }

    /// Pull in announced new messages; `None` when nothing is pending
    pub async fn refresh(&self) -> Option<Outcome> {
        let (ticket, request) = self.state.write().await.refresh()?;
        Some(self.run(ticket, request).await)
    }

    /// Probe once for new messages; `None` when polling is suspended
    pub async fn poll_once(&self) -> Option<Outcome> {
        let (ticket, request) = self.state.write().await.poll()?;

        match self.run(ticket, request).await {
            Outcome::NeedsCount(ticket, request) => Some(self.run(ticket, request).await),
            outcome => Some(outcome),
        }
    }

    /// Toggle a chain in the client-side filter
    pub async fn toggle_chain(&self, chain_id: u64) -> bool {
        self.state.write().await.toggle_chain(chain_id)
    }

    /// Replace the client-side chain filter
    pub async fn set_chain_filter(&self, chains: impl IntoIterator<Item = u64>) {
        self.state.write().await.set_chain_filter(chains);
    }

    /// Start the background polling task
    ///
    /// Spawns a tokio task that probes for new messages on a fixed interval.
    pub fn start_polling(self: Arc<Self>) -> JoinHandle<()> {
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            source = %self.source.name(),
            "Starting feed polling"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match self.poll_once().await {
                    Some(Outcome::NewMessages { count }) => {
                        tracing::debug!(count, "New messages available");
                    }
                    Some(_) => {}
                    None => tracing::trace!("Polling suspended"),
                }
            }
        })
    }

    async fn run(&self, ticket: Ticket, request: FeedRequest) -> Outcome {
        let result = self.source.fetch(&request).await;

        let (outcome, searching) = {
            let mut state = self.state.write().await;
            let outcome = match result {
                Ok(page) => state.apply(ticket, page),
                Err(e) => {
                    tracing::warn!(operation = ?ticket.operation, error = %e, "Feed request failed");
                    state.fail(ticket, e.to_string())
                }
            };
            (outcome, state.is_searching())
        };

        self.publish(&outcome, searching);
        outcome
    }

    fn publish(&self, outcome: &Outcome, searching: bool) {
        let event = match outcome {
            Outcome::Loaded { count } => FeedEvent::Loaded {
                count: *count,
                searching,
            },
            Outcome::Appended { added } => FeedEvent::Appended { added: *added },
            Outcome::NewMessages { count } => FeedEvent::NewMessages { count: *count },
            Outcome::Refreshed { added } => FeedEvent::Refreshed { added: *added },
            Outcome::Failed { operation, error } => FeedEvent::Failed {
                operation: *operation,
                error: error.clone(),
            },
            Outcome::Stale | Outcome::UpToDate | Outcome::NeedsCount(..) => return,
        };

        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::reconcile::tests::msgs;
    use crate::indexer::IndexerError;
    use crate::types::{Message, MessagePage, Pagination};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory newest-first message log
    struct MemorySource {
        log: Mutex<Vec<Message>>,
        fail: Mutex<bool>,
        requests: Mutex<Vec<FeedRequest>>,
    }

    impl MemorySource {
        fn new(hashes: &[&str]) -> Self {
            Self {
                log: Mutex::new(msgs(hashes)),
                fail: Mutex::new(false),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn publish(&self, hash: &str) {
            self.log.lock().unwrap().insert(0, msgs(&[hash]).remove(0));
        }
    }

    #[async_trait]
    impl MessageSource for MemorySource {
        fn name(&self) -> &str {
            "memory"
        }

        async fn fetch(&self, request: &FeedRequest) -> Result<MessagePage, IndexerError> {
            self.requests.lock().unwrap().push(request.clone());
            if *self.fail.lock().unwrap() {
                return Err(IndexerError::Unavailable);
            }

            let log = self.log.lock().unwrap();
            let matching: Vec<Message> = match request {
                FeedRequest::Search { content, .. } => log
                    .iter()
                    .filter(|m| m.content.contains(content.as_str()))
                    .cloned()
                    .collect(),
                FeedRequest::Latest { .. } => log.clone(),
            };

            let offset = request.offset() as usize;
            let limit = request.limit() as usize;
            Ok(MessagePage {
                result: matching.iter().skip(offset).take(limit).cloned().collect(),
                pagination: Pagination {
                    limit: request.limit(),
                    offset: request.offset(),
                    count: matching.len() as u64,
                },
                search: None,
            })
        }
    }

    fn controller(source: Arc<MemorySource>) -> FeedController<MemorySource> {
        let settings = FeedSettings {
            page_limit: 2,
            ..Default::default()
        };
        FeedController::new(source, settings, Duration::from_millis(10))
    }

    fn hashes(state: &FeedState) -> Vec<String> {
        state.messages().iter().map(|m| m.txn_hash.clone()).collect()
    }

    #[tokio::test]
    async fn test_load_and_load_more() {
        let source = Arc::new(MemorySource::new(&["0xA", "0xB", "0xC"]));
        let feed = controller(Arc::clone(&source));

        assert_eq!(feed.load().await, Outcome::Loaded { count: 2 });
        assert_eq!(feed.load_more().await, Some(Outcome::Appended { added: 1 }));

        let state = feed.snapshot().await;
        assert_eq!(hashes(&state), vec!["0xA", "0xB", "0xC"]);
        assert_eq!(state.offset(), 2);

        // Exhausted
        assert!(feed.load_more().await.is_none());
    }

    #[tokio::test]
    async fn test_poll_then_refresh() {
        let source = Arc::new(MemorySource::new(&["0xA", "0xB"]));
        let feed = controller(Arc::clone(&source));
        let mut events = feed.subscribe();

        feed.load().await;
        assert_eq!(feed.poll_once().await, Some(Outcome::UpToDate));

        source.publish("0xC");
        source.publish("0xD");
        assert_eq!(feed.poll_once().await, Some(Outcome::NewMessages { count: 2 }));

        // Polling does not touch the list
        assert_eq!(hashes(&feed.snapshot().await), vec!["0xA", "0xB"]);

        assert_eq!(feed.refresh().await, Some(Outcome::Refreshed { added: 2 }));
        let state = feed.snapshot().await;
        assert_eq!(hashes(&state), vec!["0xD", "0xC", "0xA", "0xB"]);
        assert!(!state.has_new_messages());

        assert_eq!(
            events.recv().await.unwrap(),
            FeedEvent::Loaded {
                count: 2,
                searching: false
            }
        );
        assert_eq!(events.recv().await.unwrap(), FeedEvent::NewMessages { count: 2 });
        assert_eq!(events.recv().await.unwrap(), FeedEvent::Refreshed { added: 2 });
    }

    #[tokio::test]
    async fn test_search_suspends_polling() {
        let source = Arc::new(MemorySource::new(&["0xA", "0xB"]));
        let feed = controller(Arc::clone(&source));

        feed.load().await;
        assert_eq!(feed.search("memo 0xB").await, Outcome::Loaded { count: 1 });
        assert!(feed.poll_once().await.is_none());

        assert_eq!(feed.search("").await, Outcome::Loaded { count: 2 });
        assert!(feed.poll_once().await.is_some());
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let source = Arc::new(MemorySource::new(&["0xA"]));
        let feed = controller(Arc::clone(&source));
        let mut events = feed.subscribe();

        feed.load().await;
        *source.fail.lock().unwrap() = true;

        let outcome = feed.load().await;
        assert!(matches!(outcome, Outcome::Failed { operation: Operation::Page, .. }));

        let state = feed.snapshot().await;
        assert_eq!(hashes(&state), vec!["0xA"]);
        assert_eq!(state.last_error(), Some("Indexer unavailable"));

        events.recv().await.unwrap();
        assert!(matches!(events.recv().await.unwrap(), FeedEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_failed_search_resumes_latest_feed() {
        let source = Arc::new(MemorySource::new(&["0xA", "0xB", "0xC"]));
        let feed = controller(Arc::clone(&source));
        feed.load().await;

        *source.fail.lock().unwrap() = true;
        let outcome = feed.search("gm").await;
        assert!(matches!(outcome, Outcome::Failed { operation: Operation::Page, .. }));
        *source.fail.lock().unwrap() = false;

        assert!(!feed.snapshot().await.is_searching());
        assert_eq!(feed.poll_once().await, Some(Outcome::UpToDate));

        assert_eq!(feed.load_more().await, Some(Outcome::Appended { added: 1 }));
        let last = source.requests.lock().unwrap().last().cloned();
        assert_eq!(last, Some(FeedRequest::latest(2, 2)));
        assert_eq!(hashes(&feed.snapshot().await), vec!["0xA", "0xB", "0xC"]);
    }

    #[tokio::test]
    async fn test_background_polling_detects_new_messages() {
        let source = Arc::new(MemorySource::new(&["0xA"]));
        let feed = Arc::new(controller(Arc::clone(&source)));
        let mut events = feed.subscribe();

        feed.load().await;
        events.recv().await.unwrap();

        source.publish("0xB");
        let handle = Arc::clone(&feed).start_polling();

        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, FeedEvent::NewMessages { count: 1 });

        handle.abort();
    }

    #[tokio::test]
    async fn test_chain_filter_does_not_fetch() {
        let source = Arc::new(MemorySource::new(&["0xA"]));
        let feed = controller(Arc::clone(&source));
        feed.load().await;

        let before = source.requests.lock().unwrap().len();
        assert!(feed.toggle_chain(137).await);
        feed.set_chain_filter([1]).await;
        assert_eq!(source.requests.lock().unwrap().len(), before);

        assert_eq!(feed.snapshot().await.visible_messages().count(), 1);
    }
}
