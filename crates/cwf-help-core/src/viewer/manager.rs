use std::collections::HashMap;
use std::sync::Arc;

use cwf_help_types::{HelpContext, HelpModule, HelpViewType};
use tracing::{debug, warn};

use super::{HelpViewer, HelpViewerApi, HelpViewerProxy, ViewerMode};
use crate::error::{Error, Result};
use crate::services::HelpServices;

/// One help viewer per page, created on demand in the page's viewer mode.
pub struct HelpViewerManager {
    services: Arc<HelpServices>,
    viewers: HashMap<String, Box<dyn HelpViewerApi>>,
    modes: HashMap<String, ViewerMode>,
}

impl std::fmt::Debug for HelpViewerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pages: Vec<_> = self.viewers.keys().collect();
        pages.sort();
        f.debug_struct("HelpViewerManager")
            .field("pages", &pages)
            .field("modes", &self.modes)
            .finish_non_exhaustive()
    }
}

impl HelpViewerManager {
    #[must_use]
    pub fn new(services: Arc<HelpServices>) -> Self {
        Self {
            services,
            viewers: HashMap::new(),
            modes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn services(&self) -> &Arc<HelpServices> {
        &self.services
    }

    /// Mode for a page: its override, or the configured default.
    #[must_use]
    pub fn viewer_mode(&self, page_id: &str) -> ViewerMode {
        self.modes
            .get(page_id)
            .copied()
            .unwrap_or(self.services.config().viewer_mode)
    }

    /// Change a page's mode. An existing viewer of the old mode is closed.
    pub fn set_viewer_mode(&mut self, page_id: &str, mode: ViewerMode) {
        if self.viewer_mode(page_id) != mode {
            self.remove_viewer(page_id, true);
        }
        self.modes.insert(page_id.to_string(), mode);
    }

    /// The page's viewer, created when missing and `force_create` is set.
    /// Closed viewers are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if a popup proxy cannot register its request queue.
    pub fn viewer(
        &mut self,
        page_id: &str,
        force_create: bool,
    ) -> Result<Option<&mut Box<dyn HelpViewerApi>>> {
        if self.viewers.get(page_id).is_some_and(|v| v.is_closed()) {
            debug!("Discarding closed help viewer of page {page_id}");
            self.viewers.remove(page_id);
        }

        if force_create && !self.viewers.contains_key(page_id) {
            let viewer: Box<dyn HelpViewerApi> = match self.viewer_mode(page_id) {
                ViewerMode::Embedded => Box::new(HelpViewer::embedded(page_id, &self.services)),
                ViewerMode::Popup => Box::new(HelpViewerProxy::new(page_id, &self.services)?),
            };
            self.viewers.insert(page_id.to_string(), viewer);
        }

        Ok(self.viewers.get_mut(page_id))
    }

    /// Forget a page's viewer, closing it if asked. Returns true if one existed.
    pub fn remove_viewer(&mut self, page_id: &str, close: bool) -> bool {
        match self.viewers.remove(page_id) {
            Some(mut viewer) => {
                if close {
                    viewer.close();
                }
                true
            }
            None => false,
        }
    }

    fn module(&self, module_id: &str) -> Result<HelpModule> {
        self.services
            .modules()
            .get(module_id)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound(module_id.to_string()))
    }

    /// Show a topic of a registered module in the page's viewer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleNotFound`] for an unknown module, or an error
    /// creating the viewer.
    pub fn show(
        &mut self,
        page_id: &str,
        module_id: &str,
        topic_id: Option<&str>,
        label: Option<&str>,
    ) -> Result<()> {
        let module = self.module(module_id)?;
        if let Some(viewer) = self.viewer(page_id, true)? {
            viewer.show_topic(&module, topic_id, label);
        }
        Ok(())
    }

    /// Show context-sensitive help.
    ///
    /// # Errors
    ///
    /// See [`show`](Self::show).
    pub fn show_context(&mut self, page_id: &str, context: &HelpContext) -> Result<()> {
        self.show(
            page_id,
            &context.module,
            context.topic.as_deref(),
            context.label.as_deref(),
        )
    }

    /// Show the table of contents.
    ///
    /// # Errors
    ///
    /// Returns an error creating the viewer.
    pub fn show_toc(&mut self, page_id: &str) -> Result<()> {
        if let Some(viewer) = self.viewer(page_id, true)? {
            viewer.show_view(HelpViewType::Toc);
        }
        Ok(())
    }

    /// Load registered modules into the page's viewer. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error creating the viewer.
    pub fn load(&mut self, page_id: &str, module_ids: &[&str]) -> Result<()> {
        let modules: Vec<HelpModule> = module_ids
            .iter()
            .filter_map(|id| match self.module(id) {
                Ok(module) => Some(module),
                Err(e) => {
                    warn!("Skipping help module: {e}");
                    None
                }
            })
            .collect();

        if let Some(viewer) = self.viewer(page_id, true)? {
            viewer.load(&modules);
        }
        Ok(())
    }

    /// Service inbound requests of every viewer and drop the closed ones.
    pub fn process_inbound(&mut self) {
        for viewer in self.viewers.values_mut() {
            viewer.process_inbound();
        }
        self.viewers.retain(|page_id, viewer| {
            let keep = !viewer.is_closed();
            if !keep {
                debug!("Help viewer of page {page_id} closed");
            }
            keep
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }
}
