//! Layout templates.
//!
//! A template is the description a tree is inflated from: a hierarchy of type names, ids and
//! initial attribute calls. Templates never contain views themselves; every node is constructed
//! through the allowlist at inflation time.

use crate::value::{NodeId, Value};

/// A layout template; resolved by the host from a [`LayoutId`](crate::LayoutId).
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTemplate {
    pub root: TemplateNode,
}

impl LayoutTemplate {
    pub fn new(root: TemplateNode) -> LayoutTemplate {
        LayoutTemplate { root }
    }

    /// Number of nodes in the template.
    pub fn len(&self) -> usize {
        fn count(node: &TemplateNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One node of a layout template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNode {
    /// Registered type name; must be on the allowlist.
    pub type_name: String,
    pub id: NodeId,
    /// Remotable method calls performed right after construction, in order.
    pub attributes: Vec<(String, Value)>,
    pub children: Vec<TemplateNode>,
}

impl TemplateNode {
    pub fn new(type_name: impl Into<String>) -> TemplateNode {
        TemplateNode {
            type_name: type_name.into(),
            id: NodeId::NONE,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(mut self, id: NodeId) -> TemplateNode {
        self.id = id;
        self
    }

    pub fn attr(mut self, method: impl Into<String>, value: Value) -> TemplateNode {
        self.attributes.push((method.into(), value));
        self
    }

    pub fn child(mut self, child: TemplateNode) -> TemplateNode {
        self.children.push(child);
        self
    }
}

#[test]
fn test_template_builder() {
    let template = LayoutTemplate::new(
        TemplateNode::new("LinearLayout")
            .id(NodeId(1))
            .attr("setOrientation", Value::Int(1))
            .child(TemplateNode::new("TextView").id(NodeId(2)))
            .child(
                TemplateNode::new("FrameLayout")
                    .child(TemplateNode::new("ImageView").id(NodeId(3))),
            ),
    );
    assert_eq!(template.len(), 4);
    assert_eq!(template.root.children[1].id, NodeId::NONE);
    assert_eq!(template.root.attributes.len(), 1);
}
