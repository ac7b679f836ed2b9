//! The explorer event loop.
//!
//! One tokio task owns the [`GraphStore`] and is the only code that mutates
//! it. Four streams feed the loop:
//!
//! - commands from [`ExplorerHandle`] (toggle, add root, clear, ...)
//! - paced deliveries from the [`ActionQueue`]
//! - settled search input from the [`SearchDebouncer`]
//! - completions of backend fetches, which run as separate tasks
//!
//! After every graph mutation the loop publishes a fresh snapshot to its
//! own `watch` channel and to any registered [`GraphObserver`]s.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::api::WikiApi;
use crate::config::schema::ExplorerConfig;
use crate::error::{Result, WikiGraphError};
use crate::graph::{Expansion, GraphLimits, GraphStats, GraphStore};
use crate::notify::{
    GraphObserver, Notifier, DEFAULT_TOAST_DURATION, GRAPH_CLEARED_MESSAGE, NETWORK_ERROR_DURATION,
    NETWORK_ERROR_MESSAGE, QUEUE_FULL_DURATION, QUEUE_FULL_MESSAGE,
};
use crate::observability::Metrics;
use crate::pipeline::{
    ActionQueue, SearchDebouncer, SearchInput, DEFAULT_ACTION_INTERVAL, DEFAULT_DEBOUNCE,
    DEFAULT_QUEUE_CAPACITY,
};
use crate::types::{
    ActionKind, GraphAction, GraphSnapshot, LinksResult, Node, NodeId, SearchResult, Severity,
};

// ---------------------------------------------------------------------------
// Options and published state
// ---------------------------------------------------------------------------

/// Tunables for one explorer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerOptions {
    pub limits: GraphLimits,
    pub queue_capacity: usize,
    pub action_interval: Duration,
    pub debounce: Duration,
    pub search_limit: usize,
    /// Layout hint passed through to renderers.
    pub layout: String,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            limits: GraphLimits::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            action_interval: DEFAULT_ACTION_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            search_limit: 10,
            layout: "force".to_string(),
        }
    }
}

impl ExplorerOptions {
    /// Reject options the loop cannot honour: invalid graph caps, a queue
    /// that can never accept an action, or a zero search limit.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if self.queue_capacity == 0 {
            return Err(WikiGraphError::Config("actions.capacity must be > 0".into()));
        }
        if self.search_limit == 0 {
            return Err(WikiGraphError::Config("search.limit must be > 0".into()));
        }
        Ok(())
    }
}

impl From<&ExplorerConfig> for ExplorerOptions {
    fn from(config: &ExplorerConfig) -> Self {
        Self {
            limits: config.graph.limits(),
            queue_capacity: config.actions.capacity,
            action_interval: config.actions.interval(),
            debounce: config.search.debounce(),
            search_limit: config.search.limit,
            layout: config.graph.layout.clone(),
        }
    }
}

/// State of the search box and its result list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPanel {
    /// Text last submitted to the search box.
    pub query: String,
    pub results: Vec<String>,
    /// A query completed with zero results (or failed).
    pub no_results: bool,
    pub loading: bool,
}

/// Busy/idle state of the graph view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewStatus {
    /// At least one links fetch is in flight.
    pub loading: bool,
    pub stats: GraphStats,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

enum Command {
    Toggle {
        node_id: NodeId,
        reply: oneshot::Sender<Result<GraphAction>>,
    },
    AddRoot {
        title: String,
        reply: oneshot::Sender<bool>,
    },
    SubmitSearch {
        query: String,
        reply: oneshot::Sender<()>,
    },
    SelectResult {
        title: String,
        reply: oneshot::Sender<bool>,
    },
    SelectFirst {
        reply: oneshot::Sender<Option<String>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    LoadDemo {
        reply: oneshot::Sender<()>,
    },
}

enum FetchDone {
    Links {
        node_id: NodeId,
        result: Result<LinksResult>,
    },
    Search {
        query: String,
        result: Result<SearchResult>,
    },
}

// ---------------------------------------------------------------------------
// Explorer
// ---------------------------------------------------------------------------

/// Owner of the graph and the action/search pipelines. Build one with
/// [`Explorer::new`], register observers, then [`spawn`](Explorer::spawn).
pub struct Explorer {
    options: ExplorerOptions,
    api: Arc<dyn WikiApi>,
    notifier: Arc<dyn Notifier>,
    observers: Vec<Box<dyn GraphObserver>>,
    demo: bool,
}

impl Explorer {
    pub fn new(api: Arc<dyn WikiApi>, notifier: Arc<dyn Notifier>, options: ExplorerOptions) -> Self {
        Self {
            options,
            api,
            notifier,
            observers: Vec::new(),
            demo: false,
        }
    }

    /// Also report every graph change to `observer`.
    pub fn observe(mut self, observer: impl GraphObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Start with the demonstration graph loaded.
    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }

    /// Start the event loop. Must be called inside a tokio runtime. The loop
    /// stops once every [`ExplorerHandle`] has been dropped.
    ///
    /// Options are expected to be valid (see [`ExplorerOptions::validate`]);
    /// debug builds panic on invalid ones, release builds log a warning.
    pub fn spawn(self) -> ExplorerHandle {
        let checked = self.options.validate();
        debug_assert!(checked.is_ok(), "invalid explorer options: {checked:?}");
        if let Err(err) = &checked {
            warn!(error = %err, "explorer started with invalid options");
        }

        let (queue, deliveries) =
            ActionQueue::spawn(self.options.queue_capacity, self.options.action_interval);
        let (search, searches) = SearchDebouncer::spawn(self.options.debounce);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (fetch_tx, fetches) = mpsc::unbounded_channel();
        let (graph_tx, graph_rx) = watch::channel(GraphSnapshot::default());
        let (view_tx, view_rx) = watch::channel(ViewStatus::default());
        let (panel_tx, panel_rx) = watch::channel(SearchPanel::default());
        let metrics = Arc::new(Mutex::new(Metrics::new()));

        let mut state = LoopState {
            store: GraphStore::new(self.options.limits),
            queue: queue.clone(),
            search,
            search_limit: self.options.search_limit,
            api: self.api,
            notifier: self.notifier,
            observers: self.observers,
            fetch_tx,
            graph_tx,
            view_tx,
            panel_tx,
            panel: SearchPanel::default(),
            awaited_query: None,
            links_in_flight: 0,
            metrics: metrics.clone(),
        };
        if self.demo {
            state.store.load_demo();
            state.publish_graph();
        }
        tokio::spawn(state.run(commands, deliveries, searches, fetches));

        ExplorerHandle {
            commands: commands_tx,
            queue,
            graph: graph_rx,
            view: view_rx,
            panel: panel_rx,
            metrics,
            layout: self.options.layout,
        }
    }
}

struct LoopState {
    store: GraphStore,
    queue: ActionQueue,
    search: SearchDebouncer,
    search_limit: usize,
    api: Arc<dyn WikiApi>,
    notifier: Arc<dyn Notifier>,
    observers: Vec<Box<dyn GraphObserver>>,
    fetch_tx: mpsc::UnboundedSender<FetchDone>,
    graph_tx: watch::Sender<GraphSnapshot>,
    view_tx: watch::Sender<ViewStatus>,
    panel_tx: watch::Sender<SearchPanel>,
    panel: SearchPanel,
    /// Query whose response the panel is waiting for; responses for any
    /// other query are stale and dropped.
    awaited_query: Option<String>,
    links_in_flight: usize,
    metrics: Arc<Mutex<Metrics>>,
}

impl LoopState {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut deliveries: mpsc::UnboundedReceiver<GraphAction>,
        mut searches: mpsc::UnboundedReceiver<SearchInput>,
        mut fetches: mpsc::UnboundedReceiver<FetchDone>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(action) = deliveries.recv() => self.handle_action(action),
                Some(input) = searches.recv() => self.handle_search(input),
                Some(done) = fetches.recv() => self.handle_fetch(done),
            }
        }
        debug!("explorer loop stopped");
    }

    fn record(&self, update: impl FnOnce(&mut Metrics)) {
        let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut metrics);
    }

    // -------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Toggle { node_id, reply } => {
                let _ = reply.send(self.toggle(&node_id));
            }
            Command::AddRoot { title, reply } => {
                let _ = reply.send(self.add_root(&title));
            }
            Command::SubmitSearch { query, reply } => {
                self.panel.query = query.clone();
                self.panel.no_results = false;
                self.publish_panel();
                self.search.submit(query);
                let _ = reply.send(());
            }
            Command::SelectResult { title, reply } => {
                let _ = reply.send(self.select_result(&title));
            }
            Command::SelectFirst { reply } => {
                let first = self.panel.results.first().cloned();
                if let Some(title) = &first {
                    self.select_result(title);
                }
                let _ = reply.send(first);
            }
            Command::Clear { reply } => {
                self.store.clear();
                self.publish_graph();
                self.notifier
                    .notify(GRAPH_CLEARED_MESSAGE, Severity::Info, DEFAULT_TOAST_DURATION);
                let _ = reply.send(());
            }
            Command::LoadDemo { reply } => {
                self.store.load_demo();
                self.publish_graph();
                let _ = reply.send(());
            }
        }
    }

    /// Queue an expand for a collapsed node or a collapse for an expanded one.
    fn toggle(&mut self, node_id: &str) -> Result<GraphAction> {
        let node = self
            .store
            .get_node(node_id)
            .ok_or_else(|| WikiGraphError::NodeNotFound(node_id.to_string()))?;
        let kind = if node.expanded {
            ActionKind::Collapse
        } else {
            ActionKind::Expand
        };
        match self.queue.enqueue(kind, node_id) {
            Ok(action) => Ok(action),
            Err(err) => {
                if err.is_queue_full() {
                    self.record(|m| m.actions_rejected += 1);
                    self.notifier
                        .notify(QUEUE_FULL_MESSAGE, Severity::Warning, QUEUE_FULL_DURATION);
                }
                Err(err)
            }
        }
    }

    fn add_root(&mut self, title: &str) -> bool {
        let created = self.store.add_root(title);
        self.publish_graph();
        created
    }

    fn select_result(&mut self, title: &str) -> bool {
        let created = self.add_root(title);
        self.panel = SearchPanel::default();
        self.awaited_query = None;
        self.publish_panel();
        created
    }

    // -------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------

    fn handle_action(&mut self, action: GraphAction) {
        self.queue.dequeue();
        self.record(|m| m.actions_delivered += 1);
        debug!(kind = %action.kind, node = %action.node_id, "handling action");
        match action.kind {
            ActionKind::Expand => self.expand(action.node_id),
            ActionKind::Collapse => self.collapse(&action.node_id),
        }
    }

    fn expand(&mut self, node_id: NodeId) {
        if let Some(cached) = self.store.cached_links(&node_id).cloned() {
            self.record(|m| m.cache_hits += 1);
            self.apply_expansion(&node_id, &cached);
            return;
        }
        let Some(node) = self.store.get_node(&node_id) else {
            debug!(node = %node_id, "expand skipped: node gone");
            return;
        };
        let title = node.display_title.clone();
        self.record(|m| {
            m.cache_misses += 1;
            m.fetches += 1;
        });
        self.links_in_flight += 1;
        self.publish_view();

        let api = self.api.clone();
        let done = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_links(&title).await;
            let _ = done.send(FetchDone::Links { node_id, result });
        });
    }

    fn apply_expansion(&mut self, node_id: &str, result: &LinksResult) {
        let outcome = self.store.expand(node_id, result);
        if !outcome.changed() {
            return;
        }
        if let Expansion::Reset { discarded, .. } = outcome {
            info!(node = %node_id, discarded, "graph re-centred after overflow");
        }
        self.record(|m| {
            m.expansions += 1;
            if outcome.is_reset() {
                m.hard_resets += 1;
            }
        });
        self.publish_graph();
    }

    fn collapse(&mut self, node_id: &str) {
        if self.store.collapse(node_id).is_some() {
            self.record(|m| m.collapses += 1);
            self.publish_graph();
        }
    }

    // -------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------

    fn handle_search(&mut self, input: SearchInput) {
        match input {
            SearchInput::Clear => {
                self.awaited_query = None;
                self.panel.results.clear();
                self.panel.no_results = false;
                self.panel.loading = false;
            }
            SearchInput::Query(query) => {
                self.record(|m| m.search_queries += 1);
                self.awaited_query = Some(query.clone());
                self.panel.loading = true;

                let api = self.api.clone();
                let done = self.fetch_tx.clone();
                let limit = self.search_limit;
                tokio::spawn(async move {
                    let result = api.fetch_search(&query, limit).await;
                    let _ = done.send(FetchDone::Search { query, result });
                });
            }
        }
        self.publish_panel();
    }

    // -------------------------------------------------------------------
    // Fetch completions
    // -------------------------------------------------------------------

    fn handle_fetch(&mut self, done: FetchDone) {
        match done {
            FetchDone::Links { node_id, result } => {
                self.links_in_flight = self.links_in_flight.saturating_sub(1);
                match result {
                    Ok(links) => self.apply_expansion(&node_id, &links),
                    Err(err) => {
                        warn!(node = %node_id, error = %err, "links fetch failed");
                        self.fetch_failed();
                    }
                }
                self.publish_view();
            }
            FetchDone::Search { query, result } => {
                if self.awaited_query.as_deref() != Some(query.as_str()) {
                    debug!(%query, "dropping stale search response");
                    return;
                }
                self.awaited_query = None;
                self.panel.loading = false;
                match result {
                    Ok(found) => {
                        self.panel.no_results = found.search.is_empty();
                        self.panel.results = found.search;
                        self.panel.results.truncate(self.search_limit);
                    }
                    Err(err) => {
                        warn!(%query, error = %err, "search failed");
                        self.panel.results.clear();
                        self.panel.no_results = true;
                        self.fetch_failed();
                    }
                }
                self.publish_panel();
            }
        }
    }

    fn fetch_failed(&self) {
        self.record(|m| m.fetch_failures += 1);
        self.notifier
            .notify(NETWORK_ERROR_MESSAGE, Severity::Error, NETWORK_ERROR_DURATION);
    }

    // -------------------------------------------------------------------
    // Publishing
    // -------------------------------------------------------------------

    fn publish_graph(&self) {
        let snapshot = self.store.snapshot();
        self.graph_tx.graph_changed(&snapshot.nodes, &snapshot.links);
        for observer in &self.observers {
            observer.graph_changed(&snapshot.nodes, &snapshot.links);
        }
        self.publish_view();
    }

    fn publish_view(&self) {
        self.view_tx.send_replace(ViewStatus {
            loading: self.links_in_flight > 0,
            stats: self.store.stats(),
        });
    }

    fn publish_panel(&self) {
        self.panel_tx.send_replace(self.panel.clone());
    }
}

// ---------------------------------------------------------------------------
// ExplorerHandle
// ---------------------------------------------------------------------------

/// Cheap, cloneable front door to a running explorer.
#[derive(Clone)]
pub struct ExplorerHandle {
    commands: mpsc::UnboundedSender<Command>,
    queue: ActionQueue,
    graph: watch::Receiver<GraphSnapshot>,
    view: watch::Receiver<ViewStatus>,
    panel: watch::Receiver<SearchPanel>,
    metrics: Arc<Mutex<Metrics>>,
    layout: String,
}

impl ExplorerHandle {
    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| WikiGraphError::Closed)?;
        response.await.map_err(|_| WikiGraphError::Closed)
    }

    /// Queue an expand or collapse for `node_id`, depending on its current
    /// state. Fails with `QueueFull` (after raising a warning toast) or
    /// `NodeNotFound`.
    pub async fn toggle(&self, node_id: &str) -> Result<GraphAction> {
        let node_id = node_id.to_string();
        self.call(|reply| Command::Toggle { node_id, reply }).await?
    }

    /// Seed a root article. Returns `true` if a new node was created.
    pub async fn add_root(&self, title: &str) -> Result<bool> {
        let title = title.to_string();
        self.call(|reply| Command::AddRoot { title, reply }).await
    }

    /// Record the current search box text; a query is issued once typing
    /// settles.
    pub async fn submit_search(&self, query: &str) -> Result<()> {
        let query = query.to_string();
        self.call(|reply| Command::SubmitSearch { query, reply }).await
    }

    /// Add a search result as a root and reset the search panel.
    pub async fn select_result(&self, title: &str) -> Result<bool> {
        let title = title.to_string();
        self.call(|reply| Command::SelectResult { title, reply }).await
    }

    /// Select the first visible search result, if any.
    pub async fn select_first(&self) -> Result<Option<String>> {
        self.call(|reply| Command::SelectFirst { reply }).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.call(|reply| Command::Clear { reply }).await
    }

    pub async fn load_demo(&self) -> Result<()> {
        self.call(|reply| Command::LoadDemo { reply }).await
    }

    pub fn graph(&self) -> GraphSnapshot {
        self.graph.borrow().clone()
    }

    pub fn node(&self, node_id: &str) -> Option<Node> {
        self.graph.borrow().node(node_id).cloned()
    }

    /// A receiver that observes every published snapshot.
    pub fn subscribe_graph(&self) -> watch::Receiver<GraphSnapshot> {
        self.graph.clone()
    }

    pub fn subscribe_panel(&self) -> watch::Receiver<SearchPanel> {
        self.panel.clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ViewStatus> {
        self.view.clone()
    }

    pub fn search_panel(&self) -> SearchPanel {
        self.panel.borrow().clone()
    }

    pub fn view(&self) -> ViewStatus {
        *self.view.borrow()
    }

    pub fn pending_actions(&self) -> Vec<GraphAction> {
        self.queue.pending()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }
}

impl std::fmt::Debug for ExplorerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerHandle")
            .field("queued", &self.queue.len())
            .field("layout", &self.layout)
            .finish()
    }
}
