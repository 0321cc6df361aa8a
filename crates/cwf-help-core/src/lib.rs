//! Core library for the CareWeb help subsystem.
//!
//! # Architecture
//!
//! - [`tree`]: arena-backed topic trees used by help set views
//! - [`history`]: back/forward topic navigation with change listeners
//! - [`helpset`]: help sets, format loaders, the factory and the cache
//! - [`registry`]: installed help modules with locale fallback
//! - [`keyword`]: keyword index built from keyword views
//! - [`search`]: persisted full-text index over help content
//! - [`viewer`]: the command-driven viewer, its cross-window proxy and the per-page manager
//! - [`services`]: application-wide services shared by every viewer
//! - [`config`]: configuration file handling

pub mod config;
pub mod error;
pub mod helpset;
pub mod history;
pub mod keyword;
pub mod registry;
pub mod search;
pub mod services;
pub mod tree;
pub mod viewer;

#[cfg(test)]
mod tests;

pub use config::{Directories, HelpConfig, SearchConfig};
pub use error::{Error, Result};
pub use helpset::{HelpSet, HelpSetCache, HelpSetFactory, HelpSetLoader, HelpView, JsonHelpSetLoader};
pub use history::{HelpHistory, HistoryError, TopicListener};
pub use keyword::KeywordIndex;
pub use registry::HelpModuleRegistry;
pub use search::{HelpSearchService, Relevance, SearchHit};
pub use services::HelpServices;
pub use tree::{NodeId, TopicTree};
pub use viewer::{
    HelpViewer, HelpViewerApi, HelpViewerManager, HelpViewerProxy, LoggingLauncher, ProxyState,
    ViewerMode, WindowLauncher,
};

pub use cwf_help_types::{HelpContext, HelpModule, HelpTopic, HelpViewType, encode_url};
