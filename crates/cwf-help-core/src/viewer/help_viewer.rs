use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cwf_help_ipc::{
    InvocationQueue, InvocationRequest, QueueHandle, QueueRegistry, ViewerCommand, window_name,
};
use cwf_help_types::{HelpModule, HelpTopic, HelpViewType};
use tracing::{debug, info, warn};

use super::tabs::NavigatorTab;
use super::{HelpViewerApi, ViewerMode};
use crate::helpset::{HelpSet, HelpSetCache};
use crate::history::HelpHistory;
use crate::search::{HelpSearchService, SearchHit};
use crate::services::HelpServices;

/// What the content pane currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFrame {
    pub src: Option<String>,
    pub topic: Option<HelpTopic>,
}

/// The help viewer: navigator tabs, topic history and a content pane.
///
/// The content pane follows the history; every topic selected through the
/// history becomes the frame source.
#[derive(Debug)]
pub struct HelpViewer {
    page_id: String,
    mode: ViewerMode,
    help_set_cache: Arc<HelpSetCache>,
    search: Option<Arc<Mutex<HelpSearchService>>>,
    queues: Arc<QueueRegistry>,
    keep_alive: Option<Duration>,
    help_sets: Vec<Arc<HelpSet>>,
    tabs: Vec<NavigatorTab>,
    selected: Option<HelpViewType>,
    history: HelpHistory,
    frame: Arc<Mutex<ContentFrame>>,
    visible: bool,
    loading: bool,
    closed: bool,
    queue: Option<InvocationQueue>,
    owner: Option<QueueHandle>,
}

impl HelpViewer {
    fn new(page_id: impl Into<String>, mode: ViewerMode, services: &HelpServices) -> Self {
        let frame = Arc::new(Mutex::new(ContentFrame::default()));
        let mut history = HelpHistory::with_capacity(services.config().history_size);

        let sink = Arc::clone(&frame);
        history.add_topic_listener(move |topic: Option<&HelpTopic>| {
            let mut frame = sink.lock().unwrap_or_else(PoisonError::into_inner);
            frame.src = topic.and_then(|t| t.url.clone());
            frame.topic = topic.cloned();
        });

        let popup = mode == ViewerMode::Popup;
        Self {
            page_id: page_id.into(),
            mode,
            help_set_cache: Arc::clone(services.help_sets()),
            search: services.search().cloned(),
            queues: Arc::clone(services.queues()),
            keep_alive: services.config().keep_alive(),
            help_sets: Vec::new(),
            tabs: Vec::new(),
            selected: None,
            history,
            frame,
            visible: popup,
            loading: popup,
            closed: false,
            queue: None,
            owner: None,
        }
    }

    /// Viewer living inside the page that shows help.
    #[must_use]
    pub fn embedded(page_id: impl Into<String>, services: &HelpServices) -> Self {
        Self::new(page_id, ViewerMode::Embedded, services)
    }

    /// Viewer living in a popup window opened on behalf of `proxy_page_id`.
    ///
    /// The viewer registers its own request queue and hands the name to the
    /// proxy. If the proxy is gone the viewer closes immediately.
    #[must_use]
    pub fn popup(
        page_id: impl Into<String>,
        proxy_page_id: &str,
        services: &HelpServices,
    ) -> Self {
        let mut viewer = Self::new(page_id, ViewerMode::Popup, services);
        viewer.connect(proxy_page_id);
        viewer
    }

    fn connect(&mut self, proxy_page_id: &str) {
        let proxy_name = window_name(proxy_page_id);
        let Some(owner) = self.queues.get(&proxy_name).filter(QueueHandle::is_alive) else {
            warn!("Help proxy queue {proxy_name} not available, closing viewer");
            self.close();
            return;
        };

        let queue = match InvocationQueue::open(
            &self.queues,
            window_name(&self.page_id),
            Some(InvocationRequest::close()),
            self.keep_alive,
        ) {
            Ok(queue) => queue,
            Err(e) => {
                warn!("Failed to open help viewer queue: {e}");
                self.close();
                return;
            }
        };

        let command = ViewerCommand::SetRemoteQueue {
            queue: queue.name().to_string(),
        };
        self.queue = Some(queue);

        if let Err(e) = owner.send_command(&command) {
            warn!("Failed to connect to help proxy {proxy_name}: {e}");
            self.close();
            return;
        }

        debug!("Help viewer {} connected to {proxy_name}", self.page_id);
        self.owner = Some(owner);
    }

    #[must_use]
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Name of the viewer's request queue, once connected.
    #[must_use]
    pub fn queue_name(&self) -> Option<&str> {
        self.queue.as_ref().map(InvocationQueue::name)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while waiting for help sets to be loaded.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn help_sets(&self) -> &[Arc<HelpSet>] {
        &self.help_sets
    }

    /// Navigator tabs in view type order, hidden ones included.
    #[must_use]
    pub fn tabs(&self) -> &[NavigatorTab] {
        &self.tabs
    }

    #[must_use]
    pub fn tab(&self, view_type: HelpViewType) -> Option<&NavigatorTab> {
        self.tabs.iter().find(|t| t.view_type == view_type)
    }

    #[must_use]
    pub fn selected_view(&self) -> Option<HelpViewType> {
        self.selected
    }

    #[must_use]
    pub fn history(&self) -> &HelpHistory {
        &self.history
    }

    #[must_use]
    pub fn content(&self) -> ContentFrame {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn current_url(&self) -> Option<String> {
        self.content().src
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.history.has_previous()
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.history.has_next()
    }

    pub fn go_back(&mut self) -> bool {
        let moved = self.history.previous();
        self.sync_tabs();
        moved
    }

    pub fn go_forward(&mut self) -> bool {
        let moved = self.history.next();
        self.sync_tabs();
        moved
    }

    /// Make `topic` the current topic, as when it is picked in a navigator tab.
    pub fn set_topic(&mut self, topic: Option<HelpTopic>) {
        self.history.add(topic);
        self.sync_tabs();
    }

    /// Record navigation inside the content pane.
    ///
    /// The url is mapped back to a topic of a loaded help set when possible.
    /// A repeat of the current url is ignored.
    pub fn on_content_loaded(&mut self, url: &str) {
        if self.current_url().as_deref() == Some(url) {
            return;
        }

        let topic = self
            .help_sets
            .iter()
            .find_map(|hs| hs.find_topic_by_url(url).map(|t| t.with_source(hs.name())))
            .unwrap_or_else(|| HelpTopic::with_url(url, url));

        debug!("Help content navigated to {url}");
        self.history.add(Some(topic));
        self.sync_tabs();
    }

    /// Search the loaded help sets. Yields nothing without a search service.
    pub fn search(&self, words: &str) -> Vec<SearchHit> {
        let Some(search) = &self.search else {
            return Vec::new();
        };

        let modules: Vec<HelpModule> = self
            .help_sets
            .iter()
            .map(|hs| hs.module().clone())
            .collect();
        search
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .search(words, &modules)
    }

    /// Decode and run a request from another window. Failures are logged and dropped.
    pub fn handle_request(&mut self, request: &InvocationRequest) {
        match ViewerCommand::from_request(request) {
            Ok(command) => {
                debug!(
                    "Help viewer {} executing {}",
                    self.page_id,
                    command.method_name()
                );
                self.execute(command);
            }
            Err(e) => warn!("Ignoring help request {}: {e}", request.method_name),
        }
    }

    fn sync_tabs(&mut self) {
        let current = self.history.current();
        for tab in &mut self.tabs {
            tab.on_topic_selected(current);
        }
    }

    fn reset(&mut self) {
        self.loading = true;
        self.tabs.clear();
        self.help_sets.clear();
        self.history.clear();
        self.selected = None;
    }

    fn ensure_tab(&mut self, view_type: HelpViewType) -> &mut NavigatorTab {
        let pos = match self
            .tabs
            .binary_search_by(|tab| tab.view_type.cmp(&view_type))
        {
            Ok(pos) => pos,
            Err(pos) => {
                self.tabs.insert(pos, NavigatorTab::new(view_type));
                pos
            }
        };
        &mut self.tabs[pos]
    }
}

impl HelpViewerApi for HelpViewer {
    fn mode(&self) -> ViewerMode {
        self.mode
    }

    fn show(&mut self) {
        if self.closed {
            return;
        }
        self.visible = true;
    }

    /// Selecting a view also reveals its tab.
    fn show_view(&mut self, view_type: HelpViewType) {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.view_type == view_type) else {
            return;
        };

        tab.visible = true;
        self.selected = Some(view_type);
        self.show();
    }

    fn show_home(&mut self, home_id: &str, topic_id: Option<&str>) {
        let module = self
            .help_sets
            .iter()
            .find(|hs| hs.home_id() == home_id)
            .map(|hs| hs.module().clone());

        match module {
            Some(module) => self.show_topic(&module, topic_id, None),
            None => debug!("No loaded help set with home id {home_id}"),
        }
    }

    /// An explicit label replaces the topic's own label in the history.
    fn show_topic(&mut self, help_set: &HelpModule, topic_id: Option<&str>, topic_label: Option<&str>) {
        let Some(help_set) = self.help_set_cache.get(help_set) else {
            return;
        };

        let topic_id = topic_id
            .filter(|id| !id.is_empty())
            .unwrap_or(help_set.home_id());
        let topic = help_set.topic(topic_id).map(|topic| {
            let label = topic_label
                .filter(|label| !label.is_empty())
                .unwrap_or(&topic.label);
            HelpTopic::new(topic.url.clone(), label, help_set.name())
        });

        if topic.is_none() {
            debug!("Topic {topic_id} not found in help set {}", help_set.name());
        }

        self.history.add(topic);
        self.sync_tabs();
        if !self.history.is_empty() {
            self.ensure_tab(HelpViewType::History);
        }
        self.show_view(HelpViewType::History);
    }

    fn load(&mut self, help_sets: &[HelpModule]) {
        self.reset();

        for help_set in help_sets {
            self.merge_help_set(help_set);
        }

        self.ensure_tab(HelpViewType::History).visible = false;
        self.loading = false;
        self.selected = self.tabs.iter().find(|t| t.visible).map(|t| t.view_type);
        self.history.add(None);
        self.sync_tabs();
        info!(
            "Help viewer {} loaded {} help sets",
            self.page_id,
            self.help_sets.len()
        );
    }

    fn merge_help_set(&mut self, help_set: &HelpModule) {
        let Some(loaded) = self.help_set_cache.get(help_set) else {
            return;
        };

        let key = help_set.key();
        if self
            .help_sets
            .iter()
            .any(|hs| Arc::ptr_eq(hs, &loaded) || hs.module().key() == key)
        {
            debug!("Help set {key} already loaded");
            return;
        }

        for (i, view) in loaded.views().iter().enumerate() {
            self.ensure_tab(view.view_type).add_view(&loaded, i);
        }

        if self.search.is_some() {
            self.ensure_tab(HelpViewType::Search);
        }

        self.help_sets.push(loaded);
    }

    fn close(&mut self) {
        self.visible = false;

        if self.mode == ViewerMode::Embedded || self.closed {
            return;
        }

        self.closed = true;
        if let Some(queue) = &mut self.queue {
            queue.close();
        }
        debug!("Help viewer {} closed", self.page_id);
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn process_inbound(&mut self) {
        if !self.closed && self.owner.as_ref().is_some_and(|owner| !owner.is_alive()) {
            info!("Help viewer {} lost its owner page", self.page_id);
            self.close();
        }

        let Some(queue) = self.queue.as_mut() else {
            return;
        };

        queue.touch();
        let requests: Vec<_> = std::iter::from_fn(|| queue.try_next()).collect();
        for request in requests {
            self.handle_request(&request);
        }
    }
}
