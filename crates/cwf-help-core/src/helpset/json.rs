//! Loader for help sets defined as JSON documents.
//!
//! ```json
//! {
//!   "name": "Module Help",
//!   "homeId": "intro",
//!   "topics": [{"id": "intro", "url": "intro.htm", "label": "Introduction"}],
//!   "views": [
//!     {"type": "toc", "entries": [
//!       {"topic": "intro", "children": [{"label": "Setup", "url": "setup.htm"}]}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Topic urls are relative to the directory of the module url.

use std::path::Path;

use cwf_help_types::{HelpModule, HelpTopic, HelpViewType};
use serde::Deserialize;
use tracing::debug;

use super::{HelpSet, HelpSetLoader, HelpView, resolve_topic_url, resource_path};
use crate::error::{Error, Result};
use crate::tree::NodeId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelpSetDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    home_id: String,
    #[serde(default)]
    topics: Vec<TopicEntry>,
    #[serde(default)]
    views: Vec<ViewEntry>,
}

#[derive(Debug, Deserialize)]
struct TopicEntry {
    id: String,
    url: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct ViewEntry {
    #[serde(rename = "type")]
    view_type: HelpViewType,
    #[serde(default)]
    entries: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    children: Vec<TreeEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHelpSetLoader;

impl JsonHelpSetLoader {
    /// Build a help set from document text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid help set document.
    pub fn parse(module: &HelpModule, content: &str) -> Result<HelpSet> {
        let document: HelpSetDocument = serde_json::from_str(content)?;
        let name = document.name.unwrap_or_else(|| module.title.clone());
        let mut help_set = HelpSet::new(module.clone(), name.clone(), document.home_id);

        for entry in document.topics {
            let url = resolve_topic_url(module, &entry.url);
            help_set.add_topic(entry.id, HelpTopic::new(Some(url), entry.label, name.as_str()));
        }

        for view_entry in document.views {
            let mut view = HelpView::new(view_entry.view_type, &name);
            let root = view.tree.root();
            for entry in view_entry.entries {
                add_entry(&help_set, module, &mut view, root, entry)?;
            }
            help_set.add_view(view);
        }

        Ok(help_set)
    }
}

fn add_entry(
    help_set: &HelpSet,
    module: &HelpModule,
    view: &mut HelpView,
    parent: NodeId,
    entry: TreeEntry,
) -> Result<()> {
    let topic = match &entry.topic {
        Some(topic_id) => {
            let topic = help_set.topic(topic_id).ok_or_else(|| {
                Error::HelpSet(format!("{}: unknown topic {topic_id}", module.key()))
            })?;
            match entry.label {
                Some(label) => HelpTopic::new(topic.url.clone(), label, help_set.name()),
                None => topic.clone(),
            }
        }
        None => HelpTopic::new(
            entry.url.as_deref().map(|url| resolve_topic_url(module, url)),
            entry.label.unwrap_or_default(),
            help_set.name(),
        ),
    };

    let node = view.tree.append(parent, topic, entry.id);
    for child in entry.children {
        add_entry(help_set, module, view, node, child)?;
    }
    Ok(())
}

impl HelpSetLoader for JsonHelpSetLoader {
    fn format(&self) -> &str {
        "json"
    }

    fn load(&self, module: &HelpModule, content_root: &Path) -> Result<HelpSet> {
        let path = resource_path(content_root, &module.url);
        debug!("Loading help set {} from {}", module.key(), path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::parse(module, &content)
    }
}
