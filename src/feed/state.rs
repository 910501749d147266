//! Feed State Machine
//!
//! Rendering-independent model of the message feed. Every fetch starts by
//! asking the state for a [`Ticket`] and a [`FeedRequest`]; the response is
//! handed back with its ticket and applied only if no newer request has
//! superseded it.
//!
//! States are [`Phase::Idle`], [`Phase::Loading`] and [`Phase::LoadingMore`],
//! with the new-message indicator kept alongside.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::reconcile::{append_unique, count_new, prepend_unique};
use crate::types::{FeedRequest, Message, MessagePage, Pagination, DEFAULT_LIMIT};

/// Default number of newest messages inspected when counting arrivals
pub const DEFAULT_PROBE_WINDOW: u32 = 50;

/// Visible loading phase of the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Initial load, reload or search
    Loading,
    /// Fetching the next offset window
    LoadingMore,
}

/// Logical operation a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// First page of latest or search results
    Page,
    /// Next offset window
    More,
    /// Head check: the single newest message
    Probe,
    /// Window of newest messages used to count arrivals
    Count,
    /// Fetch of the announced new messages
    Refresh,
}

/// Tag attached to every request issued by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    generation: u64,
    seq: u64,
}

/// Result of applying a response or failure to the state
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Response was superseded and ignored
    Stale,
    /// List replaced by a fresh first page
    Loaded { count: usize },
    /// Next window appended
    Appended { added: usize },
    /// Head probe found nothing newer
    UpToDate,
    /// Head changed; count the arrivals with this follow-up request
    NeedsCount(Ticket, FeedRequest),
    /// New messages are waiting to be refreshed in
    NewMessages { count: usize },
    /// Announced messages prepended
    Refreshed { added: usize },
    /// Request failed; the list is unchanged
    Failed { operation: Operation, error: String },
}

/// Tunables for the feed
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Page size for loads and load-more
    pub page_limit: u32,
    /// How many newest messages the arrival count inspects
    pub probe_window: u32,
    /// Server-side chain scope for latest requests (empty = all chains)
    pub chain_scope: Vec<u64>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_LIMIT,
            probe_window: DEFAULT_PROBE_WINDOW,
            chain_scope: Vec::new(),
        }
    }
}

/// In-memory feed state
#[derive(Debug, Clone)]
pub struct FeedState {
    settings: FeedSettings,
    messages: Vec<Message>,
    phase: Phase,
    offset: u32,
    total: Option<u64>,
    more: bool,
    query: Option<String>,
    /// Query of a search whose first page has not arrived yet
    pending_query: Option<Option<String>>,
    chain_filter: BTreeSet<u64>,
    new_messages: usize,
    last_error: Option<String>,
    generation: u64,
    seqs: HashMap<Operation, u64>,
    outstanding: HashSet<Operation>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(FeedSettings::default())
    }
}

impl FeedState {
    pub fn new(settings: FeedSettings) -> Self {
        Self {
            settings,
            messages: Vec::new(),
            phase: Phase::Idle,
            offset: 0,
            total: None,
            more: false,
            query: None,
            pending_query: None,
            chain_filter: BTreeSet::new(),
            new_messages: 0,
            last_error: None,
            generation: 0,
            seqs: HashMap::new(),
            outstanding: HashSet::new(),
        }
    }

    // ============================================
    // Accessors
    // ============================================

    /// All loaded messages, newest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Loaded messages restricted to the selected chains
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages
            .iter()
            .filter(|m| self.chain_filter.is_empty() || self.chain_filter.contains(&m.chain_id))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.settings.page_limit
    }

    /// Total reported by the last page, if any page has loaded
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Search query of the view currently on screen
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        self.query.is_some()
    }

    pub fn has_new_messages(&self) -> bool {
        self.new_messages > 0
    }

    pub fn new_message_count(&self) -> usize {
        self.new_messages
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn chain_filter(&self) -> &BTreeSet<u64> {
        &self.chain_filter
    }

    /// Hash of the newest loaded message
    pub fn newest_hash(&self) -> Option<&str> {
        self.messages.first().map(|m| m.txn_hash.as_str())
    }

    /// Whether the last loaded window suggests more messages past it
    pub fn has_more(&self) -> bool {
        self.more
    }

    // ============================================
    // Chain filter (client-side)
    // ============================================

    /// Toggle a chain in the filter, returning whether it is now selected
    pub fn toggle_chain(&mut self, chain_id: u64) -> bool {
        if self.chain_filter.remove(&chain_id) {
            false
        } else {
            self.chain_filter.insert(chain_id);
            true
        }
    }

    pub fn set_chain_filter(&mut self, chains: impl IntoIterator<Item = u64>) {
        self.chain_filter = chains.into_iter().collect();
    }

    pub fn clear_chain_filter(&mut self) {
        self.chain_filter.clear();
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    // ============================================
    // Transitions that issue requests
    // ============================================

    /// Load the first page of the current view (mount or reload)
    pub fn reload(&mut self) -> (Ticket, FeedRequest) {
        let query = self.query.clone();
        self.begin_load(query)
    }

    /// Submit a search; blank text returns to the latest view
    ///
    /// The query becomes active once its first page is applied. A failed
    /// search leaves the previous view in place.
    pub fn submit_search(&mut self, text: &str) -> (Ticket, FeedRequest) {
        let text = text.trim();
        let query = (!text.is_empty()).then(|| text.to_string());
        self.begin_load(query)
    }

    /// Request the next offset window, if idle and more exist
    pub fn load_more(&mut self) -> Option<(Ticket, FeedRequest)> {
        if self.phase != Phase::Idle || !self.has_more() {
            return None;
        }

        self.phase = Phase::LoadingMore;
        let ticket = self.issue(Operation::More);
        Some((ticket, self.page_request(self.offset + self.limit())))
    }

    /// Head probe for new messages; suspended while searching or loading
    pub fn poll(&mut self) -> Option<(Ticket, FeedRequest)> {
        if self.is_searching() || self.phase != Phase::Idle || self.freshness_in_flight() {
            return None;
        }

        let ticket = self.issue(Operation::Probe);
        Some((ticket, self.latest_request(1, 0)))
    }

    /// Fetch the announced new messages
    pub fn refresh(&mut self) -> Option<(Ticket, FeedRequest)> {
        if self.new_messages == 0 || self.is_searching() {
            return None;
        }

        let count = u32::try_from(self.new_messages).unwrap_or(u32::MAX);
        let ticket = self.issue(Operation::Refresh);
        Some((ticket, self.latest_request(count, 0)))
    }

    // ============================================
    // Applying responses
    // ============================================

    /// Apply a successful response
    pub fn apply(&mut self, ticket: Ticket, page: MessagePage) -> Outcome {
        if !self.settle(ticket) {
            tracing::debug!(operation = ?ticket.operation, "Discarding superseded response");
            return Outcome::Stale;
        }

        match ticket.operation {
            Operation::Page => {
                if let Some(query) = self.pending_query.take() {
                    self.query = query;
                }
                self.offset = 0;
                self.more = self.window_has_more(0, &page);
                self.messages = page.result;
                self.total = Some(page.pagination.count);
                self.phase = Phase::Idle;
                self.last_error = None;
                Outcome::Loaded {
                    count: self.messages.len(),
                }
            }
            Operation::More => {
                self.offset += self.limit();
                self.more = self.window_has_more(self.offset, &page);
                let added = append_unique(&mut self.messages, page.result);
                self.total = Some(page.pagination.count);
                self.phase = Phase::Idle;
                Outcome::Appended { added }
            }
            Operation::Probe => match page.newest_hash() {
                None => Outcome::UpToDate,
                Some(head) if Some(head) == self.newest_hash() => Outcome::UpToDate,
                Some(_) => {
                    let ticket = self.issue(Operation::Count);
                    let request = self.latest_request(self.settings.probe_window, 0);
                    Outcome::NeedsCount(ticket, request)
                }
            },
            Operation::Count => {
                let count = count_new(self.newest_hash(), &page.result);
                if count == 0 {
                    Outcome::UpToDate
                } else {
                    self.new_messages = count;
                    Outcome::NewMessages { count }
                }
            }
            Operation::Refresh => {
                let added = prepend_unique(&mut self.messages, page.result);
                if let Some(total) = self.total.as_mut() {
                    *total += added as u64;
                }
                self.new_messages = 0;
                Outcome::Refreshed { added }
            }
        }
    }

    /// Record a failed request, leaving the list untouched
    pub fn fail(&mut self, ticket: Ticket, error: impl Into<String>) -> Outcome {
        if !self.settle(ticket) {
            return Outcome::Stale;
        }

        if matches!(ticket.operation, Operation::Page | Operation::More) {
            self.phase = Phase::Idle;
        }
        if ticket.operation == Operation::Page {
            self.pending_query = None;
        }

        let error = error.into();
        self.last_error = Some(error.clone());
        Outcome::Failed {
            operation: ticket.operation,
            error,
        }
    }

    // ============================================
    // Internals
    // ============================================

    fn begin_load(&mut self, query: Option<String>) -> (Ticket, FeedRequest) {
        self.generation += 1;
        self.outstanding.clear();
        self.phase = Phase::Loading;
        self.new_messages = 0;
        self.last_error = None;

        let request = self.view_request(query.as_deref(), 0);
        self.pending_query = Some(query);
        (self.issue(Operation::Page), request)
    }

    /// Judge a window against the requested limit, not the echoed one
    fn window_has_more(&self, offset: u32, page: &MessagePage) -> bool {
        Pagination {
            limit: self.limit(),
            offset,
            count: page.pagination.count,
        }
        .has_more(page.result.len())
    }

    fn issue(&mut self, operation: Operation) -> Ticket {
        let seq = self.seqs.entry(operation).or_insert(0);
        *seq += 1;
        self.outstanding.insert(operation);
        Ticket {
            operation,
            generation: self.generation,
            seq: *seq,
        }
    }

    /// Accept a ticket if it is the latest of its operation in this generation
    fn settle(&mut self, ticket: Ticket) -> bool {
        let current = ticket.generation == self.generation
            && self.seqs.get(&ticket.operation) == Some(&ticket.seq);
        if current {
            self.outstanding.remove(&ticket.operation);
        }
        current
    }

    fn freshness_in_flight(&self) -> bool {
        [Operation::Probe, Operation::Count, Operation::Refresh]
            .iter()
            .any(|op| self.outstanding.contains(op))
    }

    fn latest_request(&self, limit: u32, offset: u32) -> FeedRequest {
        FeedRequest::latest(limit, offset).chains(self.settings.chain_scope.iter().copied())
    }

    fn page_request(&self, offset: u32) -> FeedRequest {
        self.view_request(self.query.as_deref(), offset)
    }

    fn view_request(&self, query: Option<&str>, offset: u32) -> FeedRequest {
        match query {
            Some(q) => FeedRequest::search(q, self.limit(), offset),
            None => self.latest_request(self.limit(), offset),
        }
    }
}
