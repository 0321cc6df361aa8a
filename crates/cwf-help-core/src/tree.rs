//! Arena-backed topic trees.
//!
//! Help set views (table of contents, keyword lists, glossaries) are trees of
//! [`HelpTopic`]s. Nodes live in a single `Vec` and refer to each other by
//! [`NodeId`], so parent links need no shared ownership. Moving a node under
//! a new parent detaches it from the old one first.

use cwf_help_types::HelpTopic;

/// Index of a node within its [`TopicTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    topic: HelpTopic,
    node_id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree of help topics with a single root.
///
/// Node ids handed out by one tree must not be used with another; doing so
/// panics or addresses the wrong node.
#[derive(Debug, Clone)]
pub struct TopicTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl TopicTree {
    /// Tree containing only a root node.
    #[must_use]
    pub fn new(root: HelpTopic) -> Self {
        Self {
            nodes: vec![Node {
                topic: root,
                node_id: None,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root, so this is never true.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached node.
    pub fn add_node(&mut self, topic: HelpTopic, node_id: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            topic,
            node_id,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a node and append it to `parent`.
    pub fn append(&mut self, parent: NodeId, topic: HelpTopic, node_id: Option<String>) -> NodeId {
        let id = self.add_node(topic, node_id);
        self.add_child(parent, id, None);
        id
    }

    /// Insert `node` under `parent` at `index`, or at the end when `index` is
    /// `None` or past the last child.
    ///
    /// The node is detached from any previous parent first. Returns false and
    /// leaves the tree untouched when the move would create a cycle.
    pub fn add_child(&mut self, parent: NodeId, node: NodeId, index: Option<usize>) -> bool {
        if parent == node || self.is_ancestor(node, parent) {
            return false;
        }

        self.detach(node);

        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(i) if i < children.len() => children.insert(i, node),
            _ => children.push(node),
        }
        self.nodes[node.0].parent = Some(parent);
        true
    }

    /// Remove `node` from `parent`. Ignored if `node` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) {
        if self.nodes[node.0].parent == Some(parent) {
            self.detach(node);
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != node);
        }
    }

    #[must_use]
    pub fn topic(&self, node: NodeId) -> &HelpTopic {
        &self.nodes[node.0].topic
    }

    #[must_use]
    pub fn node_id(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].node_id.as_deref()
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Position among siblings, `None` for a node without parent.
    #[must_use]
    pub fn index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }

    #[must_use]
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index(node)?;
        self.children(parent).get(index + 1).copied()
    }

    #[must_use]
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index(node)?.checked_sub(1)?;
        self.children(parent).get(index).copied()
    }

    /// True if `ancestor` lies on the parent chain of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order traversal of the subtree rooted at `start`.
    #[must_use]
    pub fn depth_first(&self, start: NodeId) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![start],
        }
    }

    /// First node of the attached tree carrying the given node id.
    #[must_use]
    pub fn find_by_node_id(&self, node_id: &str) -> Option<NodeId> {
        self.depth_first(self.root)
            .find(|&node| self.node_id(node) == Some(node_id))
    }

    /// First node of the attached tree whose topic points at `url`.
    #[must_use]
    pub fn find_by_url(&self, url: &str) -> Option<NodeId> {
        self.depth_first(self.root)
            .find(|&node| self.topic(node).url() == Some(url))
    }
}

/// Iterator returned by [`TopicTree::depth_first`].
#[derive(Debug)]
pub struct DepthFirst<'a> {
    tree: &'a TopicTree,
    stack: Vec<NodeId>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(node).iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(label: &str) -> HelpTopic {
        HelpTopic::with_url(format!("/web/{label}.htm"), label)
    }

    fn sample() -> (TopicTree, NodeId, NodeId, NodeId) {
        let mut tree = TopicTree::new(HelpTopic::new(None, "root", ""));
        let root = tree.root();
        let a = tree.append(root, topic("a"), Some("a".into()));
        let b = tree.append(root, topic("b"), Some("b".into()));
        let c = tree.append(a, topic("c"), Some("c".into()));
        (tree, a, b, c)
    }

    #[test]
    fn test_append_builds_children_in_order() {
        let (tree, a, b, c) = sample();
        assert_eq!(tree.children(tree.root()), &[a, b]);
        assert_eq!(tree.children(a), &[c]);
        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.index(b), Some(1));
        assert_eq!(tree.index(tree.root()), None);
    }

    #[test]
    fn test_siblings() {
        let (tree, a, b, c) = sample();
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.next_sibling(b), None);
        assert_eq!(tree.previous_sibling(b), Some(a));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.next_sibling(c), None);
        assert_eq!(tree.previous_sibling(tree.root()), None);
    }

    #[test]
    fn test_reparent_detaches_from_old_parent() {
        let (mut tree, a, b, c) = sample();

        assert!(tree.add_child(b, c, None));

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[c]);
        assert_eq!(tree.parent(c), Some(b));
    }

    #[test]
    fn test_add_child_at_index() {
        let (mut tree, a, b, c) = sample();
        let root = tree.root();

        assert!(tree.add_child(root, c, Some(0)));
        assert_eq!(tree.children(root), &[c, a, b]);

        let d = tree.add_node(topic("d"), None);
        assert!(tree.add_child(root, d, Some(99)));
        assert_eq!(tree.children(root), &[c, a, b, d]);
    }

    #[test]
    fn test_cycles_rejected() {
        let (mut tree, a, _, c) = sample();

        assert!(!tree.add_child(a, a, None));
        assert!(!tree.add_child(c, a, None));
        assert_eq!(tree.parent(a), Some(tree.root()));
        assert_eq!(tree.children(c), &[] as &[NodeId]);
    }

    #[test]
    fn test_remove_child_ignores_non_children() {
        let (mut tree, a, b, c) = sample();

        tree.remove_child(b, c);
        assert_eq!(tree.parent(c), Some(a));

        tree.remove_child(a, c);
        assert_eq!(tree.parent(c), None);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_depth_first_preorder() {
        let (tree, a, b, c) = sample();
        let order: Vec<_> = tree.depth_first(tree.root()).collect();
        assert_eq!(order, vec![tree.root(), a, c, b]);

        let sub: Vec<_> = tree.depth_first(a).collect();
        assert_eq!(sub, vec![a, c]);
    }

    #[test]
    fn test_find_by_node_id_and_url() {
        let (tree, _, b, c) = sample();
        assert_eq!(tree.find_by_node_id("c"), Some(c));
        assert_eq!(tree.find_by_node_id("zz"), None);
        assert_eq!(tree.find_by_url("/web/b.htm"), Some(b));
        assert_eq!(tree.node_id(c), Some("c"));
        assert_eq!(tree.topic(b).label, "b");
    }
}
