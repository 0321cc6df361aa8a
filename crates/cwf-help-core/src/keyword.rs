//! Keyword index built from the keyword views of help sets.

use std::collections::BTreeMap;

use cwf_help_types::HelpTopic;

use crate::helpset::HelpView;
use crate::tree::NodeId;

#[derive(Debug, Clone)]
struct KeywordEntry {
    keyword: String,
    topics: Vec<HelpTopic>,
}

/// Case-insensitive map of keywords to the topics filed under them.
///
/// Each top-level entry of a keyword view names a keyword. The entry itself
/// and every descendant that has a url are filed under that keyword.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: BTreeMap<String, KeywordEntry>,
}

impl KeywordIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_view(&mut self, view: &HelpView) {
        let tree = &view.tree;
        for &top in tree.children(tree.root()) {
            let keyword = tree.topic(top).label.clone();
            let entry = self
                .entries
                .entry(keyword.to_lowercase())
                .or_insert_with(|| KeywordEntry {
                    keyword,
                    topics: Vec::new(),
                });
            collect_topics(view, top, &mut entry.topics);
        }
    }

    /// Keywords in case-insensitive order, in the spelling first seen.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.keyword.as_str())
    }

    /// Topics for a keyword, sorted by label with duplicates removed.
    #[must_use]
    pub fn topics(&self, keyword: &str) -> Vec<HelpTopic> {
        let Some(entry) = self.entries.get(&keyword.to_lowercase()) else {
            return Vec::new();
        };

        let mut topics = entry.topics.clone();
        topics.sort();
        topics.dedup_by(|a, b| a.is_duplicate(b));
        topics
    }

    /// First keyword starting with `prefix`, ignoring case.
    #[must_use]
    pub fn find(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return None;
        }

        let prefix = prefix.to_lowercase();
        self.entries
            .range(prefix.clone()..)
            .next()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, entry)| entry.keyword.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_topics(view: &HelpView, node: NodeId, topics: &mut Vec<HelpTopic>) {
    for id in view.tree.depth_first(node) {
        let topic = view.tree.topic(id);
        if topic.has_url() {
            topics.push(topic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwf_help_types::HelpViewType;

    fn keyword_view(entries: &[(&str, &[(&str, &str)])]) -> HelpView {
        let mut view = HelpView::new(HelpViewType::Keyword, "test");
        let root = view.tree.root();
        for (keyword, topics) in entries {
            let node = view.tree.append(root, HelpTopic::new(None, *keyword, "test"), None);
            for (url, label) in *topics {
                view.tree.append(node, HelpTopic::with_url(*url, *label), None);
            }
        }
        view
    }

    #[test]
    fn test_keywords_sorted_case_insensitive() {
        let mut index = KeywordIndex::new();
        index.add_view(&keyword_view(&[
            ("printing", &[("/p.htm", "Print")]),
            ("Alerts", &[("/a.htm", "Alerts")]),
            ("backup", &[]),
        ]));

        let keywords: Vec<_> = index.keywords().collect();
        assert_eq!(keywords, vec!["Alerts", "backup", "printing"]);
        assert!(index.topics("backup").is_empty());
    }

    #[test]
    fn test_topics_merged_sorted_and_deduplicated() {
        let mut index = KeywordIndex::new();
        index.add_view(&keyword_view(&[(
            "setup",
            &[("/s2.htm", "Step two"), ("/s1.htm", "step one")],
        )]));
        index.add_view(&keyword_view(&[(
            "Setup",
            &[("/s1.htm", "Step One"), ("/s3.htm", "Advanced")],
        )]));

        assert_eq!(index.len(), 1);
        let labels: Vec<_> = index
            .topics("SETUP")
            .into_iter()
            .map(|t| t.label)
            .collect();
        assert_eq!(labels, vec!["Advanced", "Step One", "Step two"]);
    }

    #[test]
    fn test_keyword_node_with_url_is_filed() {
        let mut view = HelpView::new(HelpViewType::Keyword, "test");
        let root = view.tree.root();
        view.tree
            .append(root, HelpTopic::with_url("/k.htm", "Keyword page"), None);

        let mut index = KeywordIndex::new();
        index.add_view(&view);
        assert_eq!(index.topics("keyword page").len(), 1);
    }

    #[test]
    fn test_find_prefix() {
        let mut index = KeywordIndex::new();
        index.add_view(&keyword_view(&[
            ("Printing", &[]),
            ("privacy", &[]),
            ("alerts", &[]),
        ]));

        assert_eq!(index.find("pri"), Some("Printing"));
        assert_eq!(index.find("PRIV"), Some("privacy"));
        assert_eq!(index.find("z"), None);
        assert_eq!(index.find(""), None);
    }
}
