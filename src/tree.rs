use crate::error::ApplyError;
use crate::host::{ClickEvent, HostContext};
use crate::layout::{LayoutTemplate, TemplateNode};
use crate::registry::ClassAllowlist;
use crate::value::{LayoutId, NodeId};
use crate::view::View;
use std::collections::HashMap;
use uuid::Uuid;

/// A unique identifier for an applied tree.
///
/// (this is just a UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(Uuid);

impl TreeId {
    pub(crate) fn new() -> TreeId {
        TreeId(Uuid::new_v4())
    }
}

/// Arena key of a node; unlike [`NodeId`]s, keys are unique within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeKey(u32);

#[derive(Debug)]
struct TreeNode {
    view: Box<dyn View>,
    superview: Option<NodeKey>,
    subviews: Vec<NodeKey>,
}

/// A view tree inflated from a layout template.
///
/// Owned exclusively by whoever called `apply`; the engine keeps no reference to it.
#[derive(Debug)]
pub struct AppliedTree {
    id: TreeId,
    layout: LayoutId,
    root: NodeKey,
    nodes: HashMap<NodeKey, TreeNode>,
    /// First node (in pre-order) for each id.
    index: HashMap<NodeId, NodeKey>,
    next_key: u32,
}

impl AppliedTree {
    /// Inflates a template, constructing every node through the allowlist.
    pub(crate) fn inflate(
        layout: LayoutId,
        template: &LayoutTemplate,
        allowlist: &ClassAllowlist,
    ) -> Result<AppliedTree, ApplyError> {
        let mut tree = AppliedTree {
            id: TreeId::new(),
            layout,
            root: NodeKey(0),
            nodes: HashMap::with_capacity(template.len()),
            index: HashMap::new(),
            next_key: 0,
        };
        tree.root = tree.inflate_node(&template.root, None, allowlist)?;
        tree.rebuild_index();
        Ok(tree)
    }

    fn inflate_node(
        &mut self,
        node: &TemplateNode,
        superview: Option<NodeKey>,
        allowlist: &ClassAllowlist,
    ) -> Result<NodeKey, ApplyError> {
        let mut view = allowlist.instantiate(&node.type_name)?;
        view.base_mut().id = node.id;
        for (method, value) in &node.attributes {
            view.call_method(method, value)?;
        }
        if !node.children.is_empty() && !view.is_group() {
            return Err(ApplyError::NotAGroup {
                type_name: view.type_name(),
            });
        }

        let key = self.alloc_key();
        self.nodes.insert(
            key,
            TreeNode {
                view,
                superview,
                subviews: Vec::with_capacity(node.children.len()),
            },
        );

        for child in &node.children {
            let child_key = self.inflate_node(child, Some(key), allowlist)?;
            if let Some(node) = self.nodes.get_mut(&key) {
                node.subviews.push(child_key);
            }
        }
        Ok(key)
    }

    fn alloc_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// Rebuilds the id index after a structural change.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = match self.nodes.get(&key) {
                Some(node) => node,
                None => continue,
            };
            let id = node.view.base().id;
            if id != NodeId::NONE {
                self.index.entry(id).or_insert(key);
            }
            // reversed so that the first subview is visited first
            stack.extend(node.subviews.iter().rev().copied());
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// The layout this tree was inflated from.
    pub fn layout_id(&self) -> LayoutId {
        self.layout
    }

    /// Number of views in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &dyn View {
        // the root is never removed
        &*self.nodes[&self.root].view
    }

    /// Finds a view by id.
    pub fn find(&self, id: NodeId) -> Option<&dyn View> {
        let key = self.index.get(&id)?;
        self.nodes.get(key).map(|node| &*node.view)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut dyn View> {
        let key = *self.index.get(&id)?;
        self.view_mut(key)
    }

    /// Finds a view by id and downcasts it.
    pub fn view<T: View>(&self, id: NodeId) -> Option<&T> {
        self.find(id)?.as_any().downcast_ref::<T>()
    }

    /// Subviews of a view, in order.
    pub fn subviews(&self, id: NodeId) -> Option<Vec<&dyn View>> {
        let key = self.index.get(&id)?;
        let node = self.nodes.get(key)?;
        Some(
            node.subviews
                .iter()
                .filter_map(|key| self.nodes.get(key))
                .map(|node| &*node.view)
                .collect(),
        )
    }

    /// The view containing a view; `None` for the root.
    pub fn superview(&self, id: NodeId) -> Option<&dyn View> {
        let key = self.index.get(&id)?;
        let superview = self.nodes.get(key)?.superview?;
        self.nodes.get(&superview).map(|node| &*node.view)
    }

    /// All views in pre-order.
    pub fn walk(&self) -> Vec<&dyn View> {
        let mut views = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get(&key) {
                views.push(&*node.view);
                stack.extend(node.subviews.iter().rev().copied());
            }
        }
        views
    }

    /// Clicks a view.
    ///
    /// If the view is clickable, its callback token is sent to the host and this returns true.
    pub fn perform_click(&self, id: NodeId, host: &HostContext) -> Result<bool, ApplyError> {
        let view = self.find(id).ok_or(ApplyError::NoSuchNode(id))?;
        let base = view.base();
        match base.on_click {
            Some(token) if base.is_clickable() => {
                host.dispatch_click(ClickEvent {
                    tree: self.id,
                    node: id,
                    token,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub(crate) fn resolve(&self, id: NodeId) -> Result<NodeKey, ApplyError> {
        self.index.get(&id).copied().ok_or(ApplyError::NoSuchNode(id))
    }

    pub(crate) fn view_mut(&mut self, key: NodeKey) -> Option<&mut dyn View> {
        let node = self.nodes.get_mut(&key)?;
        let view: &mut dyn View = node.view.as_mut();
        Some(view)
    }

    /// Moves all nodes of `other` into this tree, appended as the last subview of `superview`.
    pub(crate) fn graft(
        &mut self,
        superview: NodeKey,
        mut other: AppliedTree,
    ) -> Result<(), ApplyError> {
        self.ensure_group(superview)?;
        let other_root = other.root;
        if let Some(key) = self.graft_node(&mut other, other_root, superview) {
            if let Some(node) = self.nodes.get_mut(&superview) {
                node.subviews.push(key);
            }
        }
        self.rebuild_index();
        Ok(())
    }

    fn graft_node(
        &mut self,
        other: &mut AppliedTree,
        other_key: NodeKey,
        superview: NodeKey,
    ) -> Option<NodeKey> {
        let node = other.nodes.remove(&other_key)?;
        let key = self.alloc_key();
        self.nodes.insert(
            key,
            TreeNode {
                view: node.view,
                superview: Some(superview),
                subviews: Vec::with_capacity(node.subviews.len()),
            },
        );
        for subview in node.subviews {
            if let Some(subview_key) = self.graft_node(other, subview, key) {
                if let Some(node) = self.nodes.get_mut(&key) {
                    node.subviews.push(subview_key);
                }
            }
        }
        Some(key)
    }

    /// Removes all subviews (and their subtrees) of a group view.
    pub(crate) fn remove_subviews(&mut self, key: NodeKey) -> Result<(), ApplyError> {
        self.ensure_group(key)?;
        let subviews = match self.nodes.get_mut(&key) {
            Some(node) => std::mem::take(&mut node.subviews),
            None => return Ok(()),
        };
        for subview in subviews {
            self.remove_node(subview);
        }
        self.rebuild_index();
        Ok(())
    }

    /// Does not remove the node from its superview’s subview list.
    fn remove_node(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.remove(&key) {
            for subview in node.subviews {
                self.remove_node(subview);
            }
        }
    }

    fn ensure_group(&self, key: NodeKey) -> Result<(), ApplyError> {
        match self.nodes.get(&key) {
            Some(node) if node.view.is_group() => Ok(()),
            Some(node) => Err(ApplyError::NotAGroup {
                type_name: node.view.type_name(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::widgets::{LinearLayout, Orientation, TextView};
    use crate::FailureCategory;

    impl AppliedTree {
        fn superview_of(&self, id: NodeId) -> Option<NodeId> {
            self.superview(id).map(|view| view.base().id)
        }
    }

    fn template() -> LayoutTemplate {
        LayoutTemplate::new(
            TemplateNode::new("LinearLayout")
                .id(NodeId(1))
                .attr("setOrientation", Value::Int(1))
                .child(
                    TemplateNode::new("TextView")
                        .id(NodeId(2))
                        .attr("setText", Value::String("first".into())),
                )
                .child(
                    TemplateNode::new("FrameLayout")
                        .child(TemplateNode::new("TextView").id(NodeId(2))),
                )
                .child(TemplateNode::new("ImageView").id(NodeId(3))),
        )
    }

    #[test]
    fn inflation_builds_index() {
        let tree =
            AppliedTree::inflate(LayoutId(1), &template(), &ClassAllowlist::builtin()).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.root().type_name(), "LinearLayout");
        assert_eq!(
            tree.view::<LinearLayout>(NodeId(1)).unwrap().orientation,
            Orientation::Vertical
        );
        // duplicate ids resolve to the first view in pre-order
        assert_eq!(tree.view::<TextView>(NodeId(2)).unwrap().text.text, "first");
        assert_eq!(tree.superview_of(NodeId(3)), Some(NodeId(1)));
        assert!(tree.find(NodeId(4)).is_none());
        assert_eq!(
            tree.walk().iter().map(|v| v.type_name()).collect::<Vec<_>>(),
            vec!["LinearLayout", "TextView", "FrameLayout", "TextView", "ImageView"]
        );
    }

    #[test]
    fn unknown_types_are_not_substituted() {
        let template = LayoutTemplate::new(
            TemplateNode::new("FrameLayout").child(TemplateNode::new("WebView").id(NodeId(9))),
        );
        let err = AppliedTree::inflate(LayoutId(1), &template, &ClassAllowlist::builtin())
            .unwrap_err();
        assert_eq!(err.category(), FailureCategory::Allowlist);
    }

    #[test]
    fn leaf_views_cannot_have_children() {
        let template = LayoutTemplate::new(
            TemplateNode::new("TextView").child(TemplateNode::new("TextView")),
        );
        let err = AppliedTree::inflate(LayoutId(1), &template, &ClassAllowlist::builtin())
            .unwrap_err();
        assert!(matches!(err, ApplyError::NotAGroup { type_name: "TextView" }));
    }

    #[test]
    fn bad_attributes_fail_inflation() {
        let template = LayoutTemplate::new(
            TemplateNode::new("TextView").attr("setMax", Value::Int(1)),
        );
        let err = AppliedTree::inflate(LayoutId(1), &template, &ClassAllowlist::builtin())
            .unwrap_err();
        assert_eq!(err.category(), FailureCategory::Capability);
    }

    #[test]
    fn graft_and_remove() {
        let allowlist = ClassAllowlist::builtin();
        let mut tree = AppliedTree::inflate(LayoutId(1), &template(), &allowlist).unwrap();
        let nested = AppliedTree::inflate(
            LayoutId(2),
            &LayoutTemplate::new(
                TemplateNode::new("FrameLayout")
                    .id(NodeId(10))
                    .child(TemplateNode::new("TextView").id(NodeId(11))),
            ),
            &allowlist,
        )
        .unwrap();

        let root = tree.resolve(NodeId(1)).unwrap();
        tree.graft(root, nested).unwrap();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.superview_of(NodeId(11)), Some(NodeId(10)));
        assert_eq!(tree.superview_of(NodeId(10)), Some(NodeId(1)));
        assert_eq!(tree.subviews(NodeId(1)).unwrap().len(), 4);

        tree.remove_subviews(root).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.find(NodeId(11)).is_none());
        assert!(tree.find(NodeId(1)).is_some());

        let text = LayoutTemplate::new(TemplateNode::new("TextView").id(NodeId(5)));
        let mut leaf = AppliedTree::inflate(LayoutId(3), &text, &allowlist).unwrap();
        let key = leaf.resolve(NodeId(5)).unwrap();
        assert!(leaf.remove_subviews(key).is_err());
    }
}
