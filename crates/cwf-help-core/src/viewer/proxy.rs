use std::sync::Arc;
use std::time::Duration;

use cwf_help_ipc::{InvocationQueue, InvocationRequest, QueueHandle, QueueRegistry, ViewerCommand, window_name};
use cwf_help_types::{HelpModule, HelpViewType};
use tracing::{debug, info, warn};

use super::{HelpViewerApi, ViewerMode, WindowLauncher};
use crate::error::Result;
use crate::services::HelpServices;

/// Connection state of a [`HelpViewerProxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// No remote viewer, nothing launched.
    NoRemote,
    /// Window launch requested, waiting for the viewer to connect.
    Starting,
    Connected,
    Closed,
}

/// Local stand-in for a help viewer running in a popup window.
///
/// Commands go straight to the remote viewer while it is connected.
/// Otherwise the latest command is kept (earlier ones are dropped) and, for
/// the `show` family, the popup window is launched. When the viewer connects
/// it first receives the accumulated help sets, then the kept command.
pub struct HelpViewerProxy {
    owner_page_id: String,
    viewer_url: String,
    launcher: Arc<dyn WindowLauncher>,
    queues: Arc<QueueRegistry>,
    queue: InvocationQueue,
    remote: Option<QueueHandle>,
    pending: Option<ViewerCommand>,
    help_sets: Vec<HelpModule>,
    state: ProxyState,
}

impl std::fmt::Debug for HelpViewerProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpViewerProxy")
            .field("owner_page_id", &self.owner_page_id)
            .field("state", &self.state)
            .field("remote", &self.remote)
            .field("pending", &self.pending)
            .field("help_sets", &self.help_sets.len())
            .finish_non_exhaustive()
    }
}

impl HelpViewerProxy {
    /// Proxy for the page `owner_page_id`, using the application services.
    ///
    /// # Errors
    ///
    /// Returns an error if the page already has a live proxy queue.
    pub fn new(owner_page_id: impl Into<String>, services: &HelpServices) -> Result<Self> {
        Self::with_parts(
            owner_page_id,
            &services.config().viewer_url,
            Arc::clone(services.launcher()),
            services.queues(),
            services.config().keep_alive(),
        )
    }

    /// Proxy built from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the page already has a live proxy queue.
    pub fn with_parts(
        owner_page_id: impl Into<String>,
        viewer_url: &str,
        launcher: Arc<dyn WindowLauncher>,
        queues: &Arc<QueueRegistry>,
        keep_alive: Option<Duration>,
    ) -> Result<Self> {
        let owner_page_id = owner_page_id.into();
        let queue = InvocationQueue::open(
            queues,
            window_name(&owner_page_id),
            Some(InvocationRequest::close()),
            keep_alive,
        )?;

        Ok(Self {
            owner_page_id,
            viewer_url: viewer_url.to_string(),
            launcher,
            queues: Arc::clone(queues),
            queue,
            remote: None,
            pending: None,
            help_sets: Vec::new(),
            state: ProxyState::NoRemote,
        })
    }

    #[must_use]
    pub fn state(&self) -> ProxyState {
        self.state
    }

    /// Command waiting for the remote viewer.
    #[must_use]
    pub fn pending(&self) -> Option<&ViewerCommand> {
        self.pending.as_ref()
    }

    /// Help sets replayed to the remote viewer when it connects.
    #[must_use]
    pub fn help_sets(&self) -> &[HelpModule] {
        &self.help_sets
    }

    /// Url the popup window is opened at.
    #[must_use]
    pub fn remote_url(&self) -> String {
        format!("{}?proxy={}", self.viewer_url, self.owner_page_id)
    }

    /// Name of the proxy's own queue, which is also the popup window name.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        self.queue.name()
    }

    /// Refresh the keep-alive of the proxy's queue.
    pub fn touch(&self) {
        self.queue.touch();
    }

    /// Attach the remote viewer's queue and flush buffered state.
    pub fn set_remote_queue(&mut self, remote: QueueHandle) {
        if self.state == ProxyState::Closed {
            debug!("Ignoring remote queue {} for closed proxy", remote.name());
            return;
        }

        info!(
            "Help viewer for page {} connected via {}",
            self.owner_page_id,
            remote.name()
        );
        self.remote = Some(remote);
        self.state = ProxyState::Connected;

        let deferred = self.pending.take();
        self.send(
            ViewerCommand::Load {
                help_sets: self.help_sets.clone(),
            },
            false,
        );

        if let Some(command) = deferred {
            self.send(command, false);
        }
    }

    fn remote_active(&mut self) -> bool {
        let Some(remote) = &self.remote else {
            return false;
        };

        if remote.is_alive() {
            return true;
        }

        debug!("Remote help viewer {} is gone", remote.name());
        self.remote = None;
        self.state = ProxyState::NoRemote;
        false
    }

    fn send(&mut self, command: ViewerCommand, start_remote: bool) {
        if self.state == ProxyState::Closed {
            debug!("Dropping {} for closed proxy", command.method_name());
            return;
        }

        if self.remote_active() {
            if let Some(remote) = &self.remote {
                match remote.send_command(&command) {
                    Ok(()) => return,
                    Err(e) => warn!("Failed to send {} to help viewer: {e}", command.method_name()),
                }
            }
            self.remote = None;
            self.state = ProxyState::NoRemote;
        }

        debug!("Deferring {} until the help viewer connects", command.method_name());
        self.pending = Some(command);

        if start_remote {
            self.start_remote_viewer();
        }
    }

    fn start_remote_viewer(&mut self) {
        let url = self.remote_url();
        match self.launcher.open_window(&url, self.queue.name()) {
            Ok(()) => self.state = ProxyState::Starting,
            Err(e) => warn!("Failed to open help viewer window: {e}"),
        }
    }

    fn accumulate(&mut self, help_set: &HelpModule) {
        let key = help_set.key();
        if !self.help_sets.iter().any(|hs| hs.key() == key) {
            self.help_sets.push(help_set.clone());
        }
    }
}

impl HelpViewerApi for HelpViewerProxy {
    fn mode(&self) -> ViewerMode {
        ViewerMode::Popup
    }

    fn show(&mut self) {
        self.send(ViewerCommand::Show, true);
    }

    fn show_view(&mut self, view_type: HelpViewType) {
        self.send(ViewerCommand::ShowView { view_type }, true);
    }

    fn show_home(&mut self, home_id: &str, topic_id: Option<&str>) {
        self.send(
            ViewerCommand::ShowHome {
                home_id: home_id.to_string(),
                topic_id: topic_id.map(str::to_string),
            },
            true,
        );
    }

    fn show_topic(&mut self, help_set: &HelpModule, topic_id: Option<&str>, topic_label: Option<&str>) {
        self.send(
            ViewerCommand::ShowTopic {
                help_set: help_set.clone(),
                topic_id: topic_id.map(str::to_string),
                topic_label: topic_label.map(str::to_string),
            },
            true,
        );
    }

    fn load(&mut self, help_sets: &[HelpModule]) {
        self.help_sets.clear();
        for help_set in help_sets {
            self.accumulate(help_set);
        }
        self.send(
            ViewerCommand::Load {
                help_sets: self.help_sets.clone(),
            },
            false,
        );
    }

    fn merge_help_set(&mut self, help_set: &HelpModule) {
        self.accumulate(help_set);
        self.send(
            ViewerCommand::MergeHelpSet {
                help_set: help_set.clone(),
            },
            false,
        );
    }

    /// Close the remote viewer and the proxy. Idempotent.
    fn close(&mut self) {
        if self.state == ProxyState::Closed {
            return;
        }

        self.queue.close();
        self.pending = None;

        if self.remote_active() {
            if let Some(remote) = &self.remote {
                if let Err(e) = remote.send_command(&ViewerCommand::Close) {
                    debug!("Help viewer already gone: {e}");
                }
            }
        }

        self.remote = None;
        self.state = ProxyState::Closed;
        debug!("Help proxy for page {} closed", self.owner_page_id);
    }

    fn is_closed(&self) -> bool {
        self.state == ProxyState::Closed
    }

    fn process_inbound(&mut self) {
        self.queue.touch();

        while let Some(request) = self.queue.try_next() {
            match ViewerCommand::from_request(&request) {
                Ok(ViewerCommand::SetRemoteQueue { queue }) => match self.queues.get(&queue) {
                    Some(remote) => self.set_remote_queue(remote),
                    None => warn!("Help viewer queue {queue} not found"),
                },
                Ok(ViewerCommand::Close) => self.close(),
                Ok(other) => warn!("Unexpected {} request for help proxy", other.method_name()),
                Err(e) => warn!("Ignoring help proxy request {}: {e}", request.method_name),
            }
        }
    }
}
