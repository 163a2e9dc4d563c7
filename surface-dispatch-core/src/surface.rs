//! Surface state machine
//!
//! A [`Surface`] owns the component tree and data model of one UI session
//! and applies validated messages to them as transitions:
//!
//! ```text
//! Uninitialized --createSurface--> Active --deleteSurface--> Deleted
//!                                    ^  |                       |
//!                                    +--+ update*               |
//!                                    +-------createSurface------+
//! ```
//!
//! Legacy messages take the first edge implicitly; they never leave `Deleted`.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::action::{resolve_action, ResolvedAction};
use crate::debug::{DebugSection, DebugState};
use crate::component::ComponentNode;
use crate::envelope::{Envelope, Protocol, SurfaceMessage, UPDATE_DATA_MODEL};
use crate::error::{ActionError, DataModelError, MessageError};
use crate::model::DataModel;

/// Identifier of the root component by convention
pub const ROOT_ID: &str = "root";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Active,
    Deleted,
}

/// Result of routing one message to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Dropped(DropReason),
}

/// Why a message was ignored by a surface. Neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The message targets another surface
    SurfaceMismatch,
    /// The surface has not been created, or was deleted
    NotActive,
}

/// Authoritative state of one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    id: String,
    lifecycle: Lifecycle,
    catalog_id: Option<String>,
    components: BTreeMap<String, ComponentNode>,
    data_model: DataModel,
    root_id: String,
    ready: bool,
    revision: u64,
}

impl Surface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lifecycle: Lifecycle::Uninitialized,
            catalog_id: None,
            components: BTreeMap::new(),
            data_model: DataModel::new(),
            root_id: ROOT_ID.to_string(),
            ready: false,
            revision: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn catalog_id(&self) -> Option<&str> {
        self.catalog_id.as_deref()
    }

    pub fn components(&self) -> &BTreeMap<String, ComponentNode> {
        &self.components
    }

    pub fn component(&self, id: &str) -> Option<&ComponentNode> {
        self.components.get(id)
    }

    pub fn data_model(&self) -> &DataModel {
        &self.data_model
    }

    /// Identifier the render walk starts from.
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Whether the root is defined and rendering may begin.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of transitions applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one validated message.
    ///
    /// Messages for other surfaces, and current-protocol messages for a
    /// surface that is not active, are dropped. Legacy messages activate a
    /// surface that was never created; after a delete only `createSurface`
    /// brings it back.
    pub fn apply(&mut self, envelope: Envelope) -> Result<Transition, MessageError> {
        if envelope.surface_id() != self.id {
            return Ok(Transition::Dropped(DropReason::SurfaceMismatch));
        }

        let Envelope { protocol, message } = envelope;
        match message {
            SurfaceMessage::CreateSurface { catalog_id, .. } => {
                if self.is_active() {
                    debug!(surface = %self.id, "Re-creating active surface");
                }
                self.reset(Lifecycle::Active);
                self.catalog_id = Some(catalog_id);
            }
            SurfaceMessage::DeleteSurface { .. } => {
                if !self.is_active() {
                    return Ok(Transition::Dropped(DropReason::NotActive));
                }
                self.reset(Lifecycle::Deleted);
            }
            SurfaceMessage::UpdateComponents { components, .. } => {
                if !self.activate(protocol) {
                    return Ok(Transition::Dropped(DropReason::NotActive));
                }
                for node in components {
                    self.components.insert(node.id.clone(), node);
                }
                if self.components.contains_key(&self.root_id) {
                    self.ready = true;
                }
            }
            SurfaceMessage::UpdateDataModel {
                path, op, value, ..
            } => {
                if !self.activate(protocol) {
                    return Ok(Transition::Dropped(DropReason::NotActive));
                }
                self.data_model
                    .apply(op, path.as_deref(), value)
                    .map_err(|err| MessageError::structural(UPDATE_DATA_MODEL, err.to_string()))?;
            }
            SurfaceMessage::BeginRendering {
                root, catalog_id, ..
            } => {
                if !self.activate(Protocol::Legacy) {
                    return Ok(Transition::Dropped(DropReason::NotActive));
                }
                if let Some(root) = root {
                    self.root_id = root;
                }
                if catalog_id.is_some() {
                    self.catalog_id = catalog_id;
                }
                self.ready = true;
            }
        }

        self.revision += 1;
        Ok(Transition::Applied)
    }

    /// Store a value produced by user input into the data model.
    pub fn write_binding(&mut self, path: &str, value: Value) -> Result<(), DataModelError> {
        self.data_model.set(path, value)?;
        self.revision += 1;
        Ok(())
    }

    /// Resolve the action declared by `component_id` against the current model.
    pub fn dispatch_action(&self, component_id: &str) -> Result<ResolvedAction, ActionError> {
        if !self.is_active() {
            return Err(ActionError::SurfaceInactive(self.id.clone()));
        }
        let node = self
            .components
            .get(component_id)
            .ok_or_else(|| ActionError::UnknownComponent(component_id.to_string()))?;
        let contract = node
            .component
            .action()
            .ok_or_else(|| ActionError::NoAction(component_id.to_string()))?;
        Ok(resolve_action(contract, component_id, &self.id, &self.data_model))
    }

    /// Make a never-created surface active if `protocol` allows implicit
    /// creation. A deleted surface stays deleted until `createSurface`.
    ///
    /// Returns whether the surface is active afterwards.
    fn activate(&mut self, protocol: Protocol) -> bool {
        if self.lifecycle == Lifecycle::Uninitialized && protocol == Protocol::Legacy {
            debug!(surface = %self.id, "Legacy message activates surface");
            self.reset(Lifecycle::Active);
        }
        self.is_active()
    }

    fn reset(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
        self.catalog_id = None;
        self.components.clear();
        self.data_model.clear();
        self.root_id = ROOT_ID.to_string();
        self.ready = false;
    }
}

impl DebugState for Surface {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let summary = DebugSection::new("Surface")
            .entry("id", &self.id)
            .entry("lifecycle", format!("{:?}", self.lifecycle))
            .entry("catalog", self.catalog_id.as_deref().unwrap_or("-"))
            .entry("root", &self.root_id)
            .entry("ready", self.ready.to_string())
            .entry("revision", self.revision.to_string());

        let mut components = DebugSection::new("Components");
        for (id, node) in &self.components {
            let children = node.child_ids();
            if children.is_empty() {
                components.push_entry(id, node.kind());
            } else {
                components.push_entry(id, format!("{} -> {}", node.kind(), children.join(", ")));
            }
        }

        let mut model = DebugSection::new("Data Model");
        match self.data_model.root() {
            Value::Object(map) => {
                for (key, value) in map {
                    model.push_entry(key, value.to_string());
                }
            }
            other => model.push_entry("/", other.to_string()),
        }

        vec![summary, components, model]
    }
}
