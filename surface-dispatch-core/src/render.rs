//! Read-only surface snapshots and the render walk
//!
//! A renderer never touches the live [`Surface`](crate::Surface); it takes a
//! [`SurfaceSnapshot`] (tree and data model captured together) and walks it
//! from the root with [`SurfaceSnapshot::render_tree`].

use std::collections::{BTreeMap, BTreeSet};

use crate::binding::{self, BoundValue};
use crate::component::ComponentNode;
use crate::config::Limits;
use crate::error::RenderError;
use crate::model::DataModel;
use crate::surface::{Lifecycle, Surface};

/// Consistent copy of one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub id: String,
    pub lifecycle: Lifecycle,
    pub catalog_id: Option<String>,
    pub root_id: String,
    pub ready: bool,
    pub revision: u64,
    pub components: BTreeMap<String, ComponentNode>,
    pub data_model: DataModel,
}

impl From<&Surface> for SurfaceSnapshot {
    fn from(surface: &Surface) -> Self {
        Self {
            id: surface.id().to_string(),
            lifecycle: surface.lifecycle(),
            catalog_id: surface.catalog_id().map(str::to_string),
            root_id: surface.root_id().to_string(),
            ready: surface.is_ready(),
            revision: surface.revision(),
            components: surface.components().clone(),
            data_model: surface.data_model().clone(),
        }
    }
}

/// One node of the render tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode<'a> {
    Component {
        node: &'a ComponentNode,
        children: Vec<RenderNode<'a>>,
    },
    /// A referenced identifier that has not arrived (yet)
    Placeholder { id: &'a str },
    /// A component already expanded elsewhere in this tree
    Shared { node: &'a ComponentNode },
}

impl<'a> RenderNode<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            RenderNode::Component { node, .. } | RenderNode::Shared { node } => {
                let node: &'a ComponentNode = node;
                &node.id
            }
            RenderNode::Placeholder { id } => *id,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, RenderNode::Placeholder { .. })
    }

    pub fn children(&self) -> &[RenderNode<'a>] {
        match self {
            RenderNode::Component { children, .. } => children,
            RenderNode::Placeholder { .. } | RenderNode::Shared { .. } => &[],
        }
    }

    /// Number of nodes in this subtree, placeholders included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(RenderNode::node_count).sum::<usize>()
    }

    /// Identifiers of every placeholder in this subtree, depth first.
    pub fn placeholders(&self) -> Vec<&'a str> {
        match self {
            RenderNode::Placeholder { id } => vec![*id],
            RenderNode::Shared { .. } => Vec::new(),
            RenderNode::Component { children, .. } => {
                children.iter().flat_map(RenderNode::placeholders).collect()
            }
        }
    }
}

impl SurfaceSnapshot {
    pub fn component(&self, id: &str) -> Option<&ComponentNode> {
        self.components.get(id)
    }

    /// Display text of a property value against this snapshot's model.
    pub fn resolve(&self, value: &BoundValue) -> String {
        binding::resolve(value, &self.data_model)
    }

    pub fn resolve_number(&self, value: &BoundValue) -> f64 {
        binding::resolve_number(value, &self.data_model)
    }

    /// Build the render tree from the root component.
    ///
    /// Dangling references become placeholders. Each component is expanded
    /// once; later references to it become [`RenderNode::Shared`], so the
    /// result never has more nodes than the surface has references. Trees
    /// deeper than `limits.max_tree_depth` and cyclic references are rejected
    /// with [`RenderError::DepthExceeded`].
    pub fn render_tree(&self, limits: &Limits) -> Result<RenderNode<'_>, RenderError> {
        if self.lifecycle != Lifecycle::Active {
            return Err(RenderError::Uninitialized(self.id.clone()));
        }
        let root = self
            .components
            .get(&self.root_id)
            .ok_or_else(|| RenderError::MissingRoot {
                surface_id: self.id.clone(),
                root_id: self.root_id.clone(),
            })?;
        let mut walk = Walk {
            components: &self.components,
            max_depth: limits.max_tree_depth,
            expanded: BTreeSet::new(),
            path: Vec::new(),
        };
        walk.expand(root)
    }
}

/// State of one render walk.
struct Walk<'a> {
    components: &'a BTreeMap<String, ComponentNode>,
    max_depth: usize,
    expanded: BTreeSet<&'a str>,
    /// Components from the root down to the one being expanded
    path: Vec<&'a str>,
}

impl<'a> Walk<'a> {
    fn expand(&mut self, node: &'a ComponentNode) -> Result<RenderNode<'a>, RenderError> {
        if self.path.len() >= self.max_depth || self.path.contains(&node.id.as_str()) {
            return Err(RenderError::DepthExceeded {
                id: node.id.clone(),
                max_depth: self.max_depth,
            });
        }
        self.expanded.insert(&node.id);
        self.path.push(&node.id);

        let mut children = Vec::new();
        for id in node.child_ids() {
            let child = match self.components.get(id) {
                None => RenderNode::Placeholder { id },
                Some(child) if self.expanded.contains(id) && !self.path.contains(&id) => {
                    RenderNode::Shared { node: child }
                }
                Some(child) => self.expand(child)?,
            };
            children.push(child);
        }

        self.path.pop();
        Ok(RenderNode::Component { node, children })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Validator;
    use serde_json::{json, Value};

    fn surface(lines: &[Value]) -> SurfaceSnapshot {
        let validator = Validator::default();
        let mut surface = Surface::new("main");
        surface
            .apply(
                validator
                    .validate(&json!({"createSurface": {"surfaceId": "main", "catalogId": "c"}}).to_string())
                    .unwrap()
                    .envelope,
            )
            .unwrap();
        for line in lines {
            surface
                .apply(validator.validate(&line.to_string()).unwrap().envelope)
                .unwrap();
        }
        SurfaceSnapshot::from(&surface)
    }

    fn components(entries: Value) -> Value {
        json!({"updateComponents": {"surfaceId": "main", "components": entries}})
    }

    #[test]
    fn test_render_tree_with_placeholder() {
        let snapshot = surface(&[components(json!([
            {"id": "root", "component": "Column", "children": ["title", "later"]},
            {"id": "title", "component": "Text", "text": {"path": "/title"}}
        ]))]);
        let tree = snapshot.render_tree(&Limits::default()).unwrap();
        assert_eq!(tree.id(), "root");
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.placeholders(), vec!["later"]);
        assert!(tree.children()[1].is_placeholder());
    }

    #[test]
    fn test_missing_root() {
        let snapshot = surface(&[components(json!([{"id": "title", "component": "Text", "text": "x"}]))]);
        assert_eq!(
            snapshot.render_tree(&Limits::default()),
            Err(RenderError::MissingRoot {
                surface_id: "main".into(),
                root_id: "root".into()
            })
        );
    }

    #[test]
    fn test_uninitialized_surface() {
        let snapshot = SurfaceSnapshot::from(&Surface::new("main"));
        assert_eq!(
            snapshot.render_tree(&Limits::default()),
            Err(RenderError::Uninitialized("main".into()))
        );
    }

    #[test]
    fn test_cycle_hits_depth_limit() {
        let snapshot = surface(&[components(json!([
            {"id": "root", "component": "Card", "child": "loop"},
            {"id": "loop", "component": "Card", "child": "root"}
        ]))]);
        let err = snapshot.render_tree(&Limits::default().with_max_tree_depth(8)).unwrap_err();
        assert!(matches!(err, RenderError::DepthExceeded { max_depth: 8, .. }));
    }

    #[test]
    fn test_depth_limit_is_inclusive() {
        let snapshot = surface(&[components(json!([
            {"id": "root", "component": "Column", "children": ["a"]},
            {"id": "a", "component": "Column", "children": ["b"]},
            {"id": "b", "component": "Divider"}
        ]))]);
        assert!(snapshot.render_tree(&Limits::default().with_max_tree_depth(3)).is_ok());
        assert!(snapshot.render_tree(&Limits::default().with_max_tree_depth(2)).is_err());
    }

    #[test]
    fn test_shared_children_are_expanded_once() {
        // Every layer references both components of the next layer.
        let layers = 40;
        let mut entries = vec![json!({"id": "root", "component": "Column", "children": ["l0a", "l0b"]})];
        for layer in 0..layers {
            let children = if layer + 1 < layers {
                json!([format!("l{}a", layer + 1), format!("l{}b", layer + 1)])
            } else {
                json!([])
            };
            for side in ["a", "b"] {
                entries.push(json!({"id": format!("l{layer}{side}"), "component": "Column", "children": children.clone()}));
            }
        }
        let snapshot = surface(&[components(Value::Array(entries))]);

        let tree = snapshot.render_tree(&Limits::default().with_max_tree_depth(64)).unwrap();
        // Root, then per layer one expanded pair plus one shared reference pair.
        assert_eq!(tree.node_count(), 1 + 2 + 4 * (layers - 1));
        let second = &tree.children()[1];
        assert_eq!(second.id(), "l0b");
        assert!(matches!(second.children()[0], RenderNode::Shared { .. }));
        assert!(tree.placeholders().is_empty());
    }

    #[test]
    fn test_sibling_cycle_is_rejected() {
        let snapshot = surface(&[components(json!([
            {"id": "root", "component": "Column", "children": ["a", "b"]},
            {"id": "a", "component": "Divider"},
            {"id": "b", "component": "Column", "children": ["a", "root"]}
        ]))]);
        let err = snapshot.render_tree(&Limits::default()).unwrap_err();
        assert_eq!(
            err,
            RenderError::DepthExceeded {
                id: "root".into(),
                max_depth: Limits::DEFAULT_MAX_TREE_DEPTH
            }
        );
    }

    #[test]
    fn test_resolve_against_snapshot() {
        let snapshot = surface(&[json!({"updateDataModel": {"surfaceId": "main", "value": {"title": "Hello", "n": "7"}}})]);
        assert_eq!(snapshot.resolve(&BoundValue::path("/title")), "Hello");
        assert_eq!(snapshot.resolve_number(&BoundValue::path("/n")), 7.0);
        assert_eq!(snapshot.resolve(&BoundValue::path("/missing")), "");
    }
}
