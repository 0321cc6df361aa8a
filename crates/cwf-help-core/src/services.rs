//! Application-wide help services.
//!
//! Built once at startup and shared (usually behind an `Arc`) by every
//! viewer, proxy and manager of the application.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use cwf_help_ipc::QueueRegistry;
use cwf_help_types::HelpModule;
use tracing::{info, warn};

use crate::config::HelpConfig;
use crate::error::Result;
use crate::helpset::{HelpSetCache, HelpSetFactory};
use crate::registry::HelpModuleRegistry;
use crate::search::HelpSearchService;
use crate::viewer::WindowLauncher;

pub struct HelpServices {
    config: HelpConfig,
    content_root: PathBuf,
    modules: HelpModuleRegistry,
    help_sets: Arc<HelpSetCache>,
    queues: Arc<QueueRegistry>,
    search: Option<Arc<Mutex<HelpSearchService>>>,
    launcher: Arc<dyn WindowLauncher>,
}

impl std::fmt::Debug for HelpServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpServices")
            .field("content_root", &self.content_root)
            .field("modules", &self.modules.len())
            .field("search", &self.search.is_some())
            .finish_non_exhaustive()
    }
}

impl HelpServices {
    /// Build the services described by `config`.
    ///
    /// Configured modules are registered, and the search index is opened in
    /// `search.indexDirectory` (or kept in memory) when search is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the search index cannot be opened.
    pub fn from_config(config: HelpConfig, launcher: Arc<dyn WindowLauncher>) -> Result<Self> {
        let content_root = config
            .content_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let search = if config.search.enabled {
            let service = match &config.search.index_directory {
                Some(dir) => HelpSearchService::open(dir, config.search.max_results)?,
                None => HelpSearchService::in_memory(config.search.max_results)?,
            };
            Some(Arc::new(Mutex::new(service)))
        } else {
            None
        };

        Ok(Self {
            modules: config.modules.iter().cloned().collect(),
            help_sets: Arc::new(HelpSetCache::new(HelpSetFactory::new(&content_root))),
            queues: Arc::new(QueueRegistry::new()),
            content_root,
            search,
            launcher,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &HelpConfig {
        &self.config
    }

    #[must_use]
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    #[must_use]
    pub fn modules(&self) -> &HelpModuleRegistry {
        &self.modules
    }

    /// Register a module discovered after startup.
    pub fn register_module(&mut self, module: HelpModule) {
        self.modules.register(module);
    }

    #[must_use]
    pub fn help_sets(&self) -> &Arc<HelpSetCache> {
        &self.help_sets
    }

    #[must_use]
    pub fn queues(&self) -> &Arc<QueueRegistry> {
        &self.queues
    }

    #[must_use]
    pub fn search(&self) -> Option<&Arc<Mutex<HelpSearchService>>> {
        self.search.as_ref()
    }

    #[must_use]
    pub fn launcher(&self) -> &Arc<dyn WindowLauncher> {
        &self.launcher
    }

    /// Bring the search index up to date with every registered module and
    /// save it. Modules that fail to index are logged and skipped.
    ///
    /// Returns the number of pages indexed.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be saved.
    pub fn index_help_modules(&self) -> Result<usize> {
        let Some(search) = &self.search else {
            return Ok(0);
        };

        let mut search = search.lock().unwrap_or_else(PoisonError::into_inner);
        let mut total = 0;
        for module in self.modules.iter() {
            match search.index_help_module(module, &self.content_root) {
                Ok(count) => total += count,
                Err(e) => warn!("Failed to index help module {}: {e}", module.id),
            }
        }

        search.save()?;
        if total > 0 {
            info!("Indexed {total} help pages");
        }
        Ok(total)
    }
}
