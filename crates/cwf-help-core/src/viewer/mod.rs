//! Help viewers and the commands that drive them.
//!
//! Every viewer implements [`HelpViewerApi`]. [`HelpViewer`] is the viewer
//! itself; in popup mode it runs in its own window and receives commands
//! through a request queue. [`HelpViewerProxy`] stands in for a popup viewer
//! inside the page that asked for help, launching the window on demand and
//! buffering the most recent command until the window connects.
//! [`HelpViewerManager`] hands out one viewer per page.

mod help_viewer;
mod manager;
mod proxy;
mod tabs;

pub use help_viewer::{ContentFrame, HelpViewer};
pub use manager::HelpViewerManager;
pub use proxy::{HelpViewerProxy, ProxyState};
pub use tabs::{NavigatorTab, TabContent, ViewRef};

use cwf_help_ipc::ViewerCommand;
use cwf_help_types::{HelpModule, HelpViewType};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Where a page's help viewer lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerMode {
    /// Inside the requesting page, hidden rather than destroyed on close.
    Embedded,
    /// In a separate browser window, reached through a proxy.
    #[default]
    Popup,
}

/// Operations every help viewer supports.
pub trait HelpViewerApi: Send {
    fn mode(&self) -> ViewerMode;

    /// Bring the viewer to the front.
    fn show(&mut self);

    /// Show the viewer with the given navigator tab selected.
    fn show_view(&mut self, view_type: HelpViewType);

    /// Show a topic of the loaded help set with the given home id.
    fn show_home(&mut self, home_id: &str, topic_id: Option<&str>);

    /// Show a topic of a help set, defaulting to the help set's home topic.
    fn show_topic(&mut self, help_set: &HelpModule, topic_id: Option<&str>, topic_label: Option<&str>);

    /// Replace the loaded help sets.
    fn load(&mut self, help_sets: &[HelpModule]);

    /// Add a help set to the loaded ones.
    fn merge_help_set(&mut self, help_set: &HelpModule);

    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// Service requests that arrived from other windows.
    fn process_inbound(&mut self) {}

    /// Dispatch a decoded command to the matching operation.
    fn execute(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::Show => self.show(),
            ViewerCommand::ShowView { view_type } => self.show_view(view_type),
            ViewerCommand::ShowHome { home_id, topic_id } => {
                self.show_home(&home_id, topic_id.as_deref());
            }
            ViewerCommand::ShowTopic {
                help_set,
                topic_id,
                topic_label,
            } => self.show_topic(&help_set, topic_id.as_deref(), topic_label.as_deref()),
            ViewerCommand::Load { help_sets } => self.load(&help_sets),
            ViewerCommand::MergeHelpSet { help_set } => self.merge_help_set(&help_set),
            ViewerCommand::Close => self.close(),
            ViewerCommand::SetRemoteQueue { queue } => {
                warn!("Ignoring setRemoteQueue({queue}) sent to a help viewer");
            }
        }
    }
}

/// Opens browser windows for popup viewers.
pub trait WindowLauncher: Send + Sync {
    /// Open `url` in the window called `window_name`, reusing it if open.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be opened (for example when
    /// popups are blocked).
    fn open_window(&self, url: &str, window_name: &str) -> Result<()>;
}

/// Launcher for hosts without a window system; records the request in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLauncher;

impl WindowLauncher for LoggingLauncher {
    fn open_window(&self, url: &str, window_name: &str) -> Result<()> {
        info!("Open help window {window_name} at {url}");
        Ok(())
    }
}
