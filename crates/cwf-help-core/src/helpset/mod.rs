//! Help sets: the loaded form of a help module.
//!
//! A [`HelpSet`] carries the topics of one module and the navigator views
//! it provides. Loading is delegated to a [`HelpSetLoader`] chosen by the
//! module's format; [`HelpSetFactory`] owns the loaders and
//! [`HelpSetCache`] memoizes successful loads.

mod cache;
mod json;

pub use cache::HelpSetCache;
pub use json::JsonHelpSetLoader;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cwf_help_types::{HelpModule, HelpTopic, HelpViewType, WEB_ROOT, encode_url};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tree::TopicTree;

/// One navigator view of a help set.
#[derive(Debug, Clone)]
pub struct HelpView {
    pub view_type: HelpViewType,
    pub tree: TopicTree,
}

impl HelpView {
    /// Empty view whose root is labelled after the view type.
    #[must_use]
    pub fn new(view_type: HelpViewType, source: &str) -> Self {
        Self {
            view_type,
            tree: TopicTree::new(HelpTopic::new(None, view_type.label(), source)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HelpSet {
    module: HelpModule,
    name: String,
    home_id: String,
    topics: BTreeMap<String, HelpTopic>,
    views: Vec<HelpView>,
}

impl HelpSet {
    #[must_use]
    pub fn new(module: HelpModule, name: impl Into<String>, home_id: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
            home_id: home_id.into(),
            topics: BTreeMap::new(),
            views: Vec::new(),
        }
    }

    pub fn add_topic(&mut self, id: impl Into<String>, topic: HelpTopic) {
        self.topics.insert(id.into(), topic);
    }

    pub fn add_view(&mut self, view: HelpView) {
        self.views.push(view);
    }

    #[must_use]
    pub fn module(&self) -> &HelpModule {
        &self.module
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn home_id(&self) -> &str {
        &self.home_id
    }

    #[must_use]
    pub fn views(&self) -> &[HelpView] {
        &self.views
    }

    #[must_use]
    pub fn view(&self, view_type: HelpViewType) -> Option<&HelpView> {
        self.views.iter().find(|v| v.view_type == view_type)
    }

    /// Topics keyed by id.
    pub fn topics(&self) -> impl Iterator<Item = (&str, &HelpTopic)> {
        self.topics.iter().map(|(id, topic)| (id.as_str(), topic))
    }

    /// Look a topic up by id, falling back to a url match.
    #[must_use]
    pub fn topic(&self, id_or_url: &str) -> Option<&HelpTopic> {
        self.topics
            .get(id_or_url)
            .or_else(|| self.find_topic_by_url(id_or_url))
    }

    /// Find a topic by url, in the topic map or any view.
    ///
    /// Anything before the web root is ignored, so a fully qualified url
    /// matches the servable path it was loaded from.
    #[must_use]
    pub fn find_topic_by_url(&self, url: &str) -> Option<&HelpTopic> {
        let wanted = web_relative(url);
        let matches = |topic: &&HelpTopic| topic.url().map(web_relative) == Some(wanted);

        self.topics.values().find(matches).or_else(|| {
            self.views.iter().find_map(|view| {
                view.tree
                    .depth_first(view.tree.root())
                    .map(|node| view.tree.topic(node))
                    .find(matches)
            })
        })
    }
}

fn web_relative(url: &str) -> &str {
    let marker = format!("{WEB_ROOT}/");
    url.find(&marker).map_or(url, |i| &url[i..])
}

/// Resolve a topic path relative to the module's directory.
///
/// Already servable paths (starting with `/`) are kept.
#[must_use]
pub fn resolve_topic_url(module: &HelpModule, path: &str) -> String {
    if path.starts_with('/') || path.contains("://") {
        path.to_string()
    } else {
        encode_url(&format!("{}{path}", module.base_path()))
    }
}

/// File system location of a help resource under `content_root`.
#[must_use]
pub fn resource_path(content_root: &Path, help_path: &str) -> PathBuf {
    let encoded = encode_url(help_path);
    content_root.join(encoded.trim_start_matches('/'))
}

/// Loads help sets of one format.
pub trait HelpSetLoader: Send + Sync {
    /// Format name matched against [`HelpModule::format`].
    fn format(&self) -> &str;

    /// Load the help set described by `module`.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition cannot be read or parsed.
    fn load(&self, module: &HelpModule, content_root: &Path) -> Result<HelpSet>;
}

/// Creates help sets through the loader registered for each format.
pub struct HelpSetFactory {
    loaders: HashMap<String, Box<dyn HelpSetLoader>>,
    content_root: PathBuf,
}

impl std::fmt::Debug for HelpSetFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.loaders.keys().collect();
        formats.sort();
        f.debug_struct("HelpSetFactory")
            .field("formats", &formats)
            .field("content_root", &self.content_root)
            .finish()
    }
}

impl HelpSetFactory {
    /// Factory with the built-in `json` loader.
    #[must_use]
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        let mut factory = Self {
            loaders: HashMap::new(),
            content_root: content_root.into(),
        };
        factory.register(JsonHelpSetLoader);
        factory
    }

    /// Add or replace the loader for its format.
    pub fn register(&mut self, loader: impl HelpSetLoader + 'static) {
        let format = loader.format().to_ascii_lowercase();
        debug!("Registered help set loader for format {format}");
        self.loaders.insert(format, Box::new(loader));
    }

    #[must_use]
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Load a help set, reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] when no loader handles the module's
    /// format, or the loader's error.
    pub fn try_create(&self, module: &HelpModule) -> Result<HelpSet> {
        let loader = self
            .loaders
            .get(&module.format.to_ascii_lowercase())
            .ok_or_else(|| Error::UnsupportedFormat(module.format.clone()))?;
        loader.load(module, &self.content_root)
    }

    /// Load a help set. Failures are logged and yield `None`.
    #[must_use]
    pub fn create(&self, module: &HelpModule) -> Option<Arc<HelpSet>> {
        match self.try_create(module) {
            Ok(help_set) => Some(Arc::new(help_set)),
            Err(e) => {
                warn!("Failed to load help module {}: {e}", module.key());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> HelpModule {
        HelpModule::new("m", "Module", "~./org/m/help/helpset.json")
    }

    #[test]
    fn test_resolve_topic_url() {
        let module = module();
        assert_eq!(resolve_topic_url(&module, "intro.htm"), "/web/org/m/help/intro.htm");
        assert_eq!(resolve_topic_url(&module, "/abs/x.htm"), "/abs/x.htm");
        assert_eq!(
            resolve_topic_url(&module, "http://host/x.htm"),
            "http://host/x.htm"
        );
    }

    #[test]
    fn test_resource_path() {
        let root = Path::new("/srv/content");
        assert_eq!(
            resource_path(root, "~./org/m/help/helpset.json"),
            PathBuf::from("/srv/content/web/org/m/help/helpset.json")
        );
        assert_eq!(
            resource_path(root, "/other/a.json"),
            PathBuf::from("/srv/content/other/a.json")
        );
    }

    #[test]
    fn test_topic_lookup_by_id_and_url() {
        let mut help_set = HelpSet::new(module(), "Module Help", "intro");
        help_set.add_topic("intro", HelpTopic::with_url("/web/org/m/help/intro.htm", "Intro"));

        let mut view = HelpView::new(HelpViewType::Toc, "Module Help");
        let root = view.tree.root();
        view.tree.append(
            root,
            HelpTopic::with_url("/web/org/m/help/extra.htm", "Extra"),
            None,
        );
        help_set.add_view(view);

        assert_eq!(help_set.topic("intro").unwrap().label, "Intro");
        assert_eq!(
            help_set
                .topic("http://host:8080/app/web/org/m/help/intro.htm")
                .unwrap()
                .label,
            "Intro"
        );
        assert_eq!(
            help_set
                .find_topic_by_url("/web/org/m/help/extra.htm")
                .unwrap()
                .label,
            "Extra"
        );
        assert!(help_set.topic("missing").is_none());
        assert!(help_set.view(HelpViewType::Toc).is_some());
        assert!(help_set.view(HelpViewType::Glossary).is_none());
    }

    #[test]
    fn test_factory_rejects_unknown_format() {
        let factory = HelpSetFactory::new("/nonexistent");
        let mut module = module();
        module.format = "chm".to_string();

        assert!(matches!(
            factory.try_create(&module),
            Err(Error::UnsupportedFormat(f)) if f == "chm"
        ));
        assert!(factory.create(&module).is_none());
    }
}
