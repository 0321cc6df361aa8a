use std::sync::Arc;

use cwf_help_types::{HelpTopic, HelpViewType};

use crate::helpset::{HelpSet, HelpView};
use crate::keyword::KeywordIndex;
use crate::tree::NodeId;

/// A view of a loaded help set shown in a navigator tab.
#[derive(Debug, Clone)]
pub struct ViewRef {
    pub help_set: Arc<HelpSet>,
    view_index: usize,
}

impl ViewRef {
    #[must_use]
    pub fn view(&self) -> &HelpView {
        &self.help_set.views()[self.view_index]
    }
}

/// What a navigator tab presents.
#[derive(Debug, Clone)]
pub enum TabContent {
    /// Topic trees (table of contents, glossary).
    Contents(Vec<ViewRef>),
    /// Keyword lists merged into one index.
    Keywords {
        views: Vec<ViewRef>,
        index: KeywordIndex,
    },
    Search,
    History,
}

#[derive(Debug, Clone)]
pub struct NavigatorTab {
    pub view_type: HelpViewType,
    pub visible: bool,
    pub content: TabContent,
    selected: Option<(usize, NodeId)>,
}

impl NavigatorTab {
    #[must_use]
    pub fn new(view_type: HelpViewType) -> Self {
        let content = match view_type {
            HelpViewType::Toc | HelpViewType::Glossary => TabContent::Contents(Vec::new()),
            HelpViewType::Keyword | HelpViewType::Index => TabContent::Keywords {
                views: Vec::new(),
                index: KeywordIndex::new(),
            },
            HelpViewType::Search => TabContent::Search,
            HelpViewType::History => TabContent::History,
        };

        Self {
            view_type,
            visible: true,
            content,
            selected: None,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.view_type.label()
    }

    /// Attach a view of `help_set`. Search and history tabs ignore views.
    pub fn add_view(&mut self, help_set: &Arc<HelpSet>, view_index: usize) {
        let view_ref = ViewRef {
            help_set: Arc::clone(help_set),
            view_index,
        };

        match &mut self.content {
            TabContent::Contents(views) => views.push(view_ref),
            TabContent::Keywords { views, index } => {
                index.add_view(view_ref.view());
                views.push(view_ref);
            }
            TabContent::Search | TabContent::History => {}
        }
    }

    #[must_use]
    pub fn views(&self) -> &[ViewRef] {
        match &self.content {
            TabContent::Contents(views) | TabContent::Keywords { views, .. } => views,
            TabContent::Search | TabContent::History => &[],
        }
    }

    /// Node of the current topic in this tab, as (view position, node).
    #[must_use]
    pub fn selected(&self) -> Option<(usize, NodeId)> {
        self.selected
    }

    /// Follow the viewer's current topic. Tabs not containing it clear their selection.
    pub fn on_topic_selected(&mut self, topic: Option<&HelpTopic>) {
        self.selected = topic.and_then(|topic| self.locate(topic));
    }

    /// Node showing `topic` in one of this tab's views, as (view position, node).
    #[must_use]
    pub fn locate(&self, topic: &HelpTopic) -> Option<(usize, NodeId)> {
        let url = topic.url()?;
        self.views()
            .iter()
            .enumerate()
            .find_map(|(i, view_ref)| view_ref.view().tree.find_by_url(url).map(|node| (i, node)))
    }
}
