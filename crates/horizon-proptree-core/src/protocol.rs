//! ID-keyed XML sync protocol.
//!
//! One side encodes a subtree with [`SyncForest::encode`]; the other side
//! either builds a fresh copy with [`SyncForest::decode_create`] or, once both
//! sides share the topology, pushes value changes with
//! [`SyncForest::decode_patch`]. Nodes are correlated by their [`NodeId`].
//!
//! Decoding is two-phase. The whole document is validated and turned into a
//! plan first; the forest is only touched once the plan is complete. Any
//! [`ProtocolError`] therefore leaves the forest exactly as it was.
//!
//! # Wire format
//!
//! Every node is a `Parameter` element:
//!
//! ```text
//! <Parameter Name="gain" Enable="1" Visible="1" Type="5" TypeString="SpinBox" ID="305419896"
//!            Value="3" Step="1" MinValue="0" MaxValue="10"/>
//! ```
//!
//! Generic children follow as nested `Parameter` elements. Kinds that own an
//! embedded model (vectors, colors, combos, splines, matrices) write their
//! structure as payload elements instead and never carry generic children.
//!
//! # Example
//!
//! ```
//! use horizon_proptree_core::{NodeValue, SyncForest};
//!
//! let mut sender = SyncForest::new();
//! let root = sender.create_node("settings", NodeValue::Folder);
//! let check = sender.create_child(root, "enabled", NodeValue::Checkbox(true));
//!
//! let mut receiver = SyncForest::new();
//! let copy = receiver.decode_create(&sender.encode(root).unwrap()).unwrap();
//! assert_eq!(receiver.child_count(copy), 1);
//!
//! sender.node_mut(check).unwrap().set_value(NodeValue::Checkbox(false));
//! receiver.decode_patch(copy, &sender.encode(root).unwrap()).unwrap();
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, ProtocolResult};
use crate::forest::NodeKey;
use crate::id::{NodeId, SharedIdGenerator};
use crate::kind::NodeKind;
use crate::logging::targets;
use crate::sync::{SyncForest, SyncNode};
use crate::value::{
    Axis, Bounded, Combo, ComboItem, Knot, NodeValue, Rgb, Rgba, Stepped, VectorValuator,
};
use crate::xml::{Document, Element};

/// Element name of every node.
pub const NODE_ELEMENT: &str = "Parameter";

const VECTOR_ELEMENTS: [&str; 4] = ["VecX", "VecY", "VecZ", "VecW"];
const VECTOR_AXES: [&str; 4] = ["X", "Y", "Z", "W"];
const RGB_ELEMENT: &str = "RGBComponent";
const RGBA_ELEMENT: &str = "RGBAComponent";
const COLOR_CHANNELS: [&str; 4] = ["Red", "Green", "Blue", "Alpha"];
const COMBO_ITEM_ELEMENT: &str = "ComboBoxItem";
const SPLINE_KNOT_ELEMENT: &str = "SplineKnot";
const MATRIX_ROWS: [&str; 4] = ["row0", "row1", "row2", "row3"];

// ============================================================================
// Public API
// ============================================================================

impl SyncForest {
    /// Encode the subtree rooted at `key`.
    ///
    /// Returns `None` for a stale key.
    #[tracing::instrument(skip(self), target = "horizon_proptree_core::protocol", level = "trace")]
    pub fn encode(&self, key: NodeKey) -> Option<Document> {
        self.encode_element(key).map(Document::new)
    }

    /// Build a brand-new detached subtree from `doc` and return its root.
    #[tracing::instrument(skip(self, doc), target = "horizon_proptree_core::protocol", level = "trace")]
    pub fn decode_create(&mut self, doc: &Document) -> ProtocolResult<NodeKey> {
        let mut live: HashSet<NodeId> = self.iter().map(|(_, node)| node.id()).collect();
        let plan = plan_create(doc.root(), self.id_generator(), &mut live)?;
        let count = plan.count();
        let key = self.build(plan);
        tracing::debug!(target: targets::PROTOCOL, ?key, count, "created subtree from document");
        Ok(key)
    }

    /// Build a subtree from `doc` and append it as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn decode_create_into(&mut self, parent: NodeKey, doc: &Document) -> ProtocolResult<NodeKey> {
        let key = self.decode_create(doc)?;
        self.push_back(parent, key);
        Ok(key)
    }

    /// Update the existing subtree rooted at `key` from `doc`.
    ///
    /// The root element must carry the ID of `key`. Every nested element is
    /// matched to a node of the subtree by ID. Names, flags and payloads are
    /// updated; topology, IDs and kinds never change.
    #[tracing::instrument(skip(self, doc), target = "horizon_proptree_core::protocol", level = "trace")]
    pub fn decode_patch(&mut self, key: NodeKey, doc: &Document) -> ProtocolResult<()> {
        let root = doc.root();
        let header = read_header(root)?;
        let Some(node) = self.node(key) else {
            return Err(ProtocolError::UnknownNodeId { id: header.id });
        };
        if node.id() != header.id {
            return Err(ProtocolError::IdMismatch {
                expected: node.id(),
                found: header.id,
            });
        }

        let mut plan = Vec::new();
        self.plan_patch(key, root, header, &mut plan)?;

        let mut changed = 0usize;
        for update in plan {
            if let Some(node) = self.node_mut(update.key) {
                changed += usize::from(update.apply(node));
            }
        }
        tracing::debug!(target: targets::PROTOCOL, ?key, changed, "applied patch");
        Ok(())
    }

    /// Route a patch to the node it addresses, searching from `start`.
    ///
    /// This is the entry point for a dispatcher that receives patches for
    /// arbitrary nodes. Returns the patched node.
    pub fn apply_patch(&mut self, start: NodeKey, doc: &Document) -> ProtocolResult<NodeKey> {
        let header = read_header(doc.root())?;
        let key = self
            .find_node_id(start, header.id)
            .ok_or(ProtocolError::UnknownNodeId { id: header.id })?;
        self.decode_patch(key, doc)?;
        Ok(key)
    }
}

// ============================================================================
// Encoding
// ============================================================================

impl SyncForest {
    fn encode_element(&self, key: NodeKey) -> Option<Element> {
        let node = self.node(key)?;
        let mut element = Element::new(NODE_ELEMENT);
        element.set_attribute("Name", node.name());
        element.set_attribute("Enable", u8::from(node.is_enabled()));
        element.set_attribute("Visible", u8::from(node.is_visible()));
        element.set_attribute("Type", node.kind().code());
        element.set_attribute("TypeString", node.kind().type_string());
        element.set_attribute("ID", node.id());
        write_payload(node.value(), &mut element);

        if !node.kind().skip_children() {
            for child in self.children(key) {
                if let Some(child_element) = self.encode_element(child) {
                    element.push_child(child_element);
                }
            }
        }
        Some(element)
    }
}

fn write_payload(value: &NodeValue, element: &mut Element) {
    match value {
        NodeValue::Root | NodeValue::Folder => {}
        NodeValue::Checkbox(checked) => element.set_attribute("Check", u8::from(*checked)),
        NodeValue::SpinBoxInt(v) | NodeValue::IntValuator(v) => write_stepped(element, v),
        NodeValue::SpinBoxFloat(v) | NodeValue::FloatValuator(v) => write_stepped(element, v),
        NodeValue::Range(v) => write_bounded(element, v),
        NodeValue::RangeInt(v) => write_bounded(element, v),
        NodeValue::Vector3Valuator(v) => {
            element.set_attribute("X", v.x);
            element.set_attribute("Y", v.y);
            element.set_attribute("Z", v.z);
            element.set_attribute("MinValue", v.min);
            element.set_attribute("MaxValue", v.max);
            element.set_attribute("Step", v.step);
        }
        NodeValue::ComboSimple(combo) | NodeValue::ComboComplex(combo) => {
            element.set_attribute("NumItem", combo.items.len());
            element.set_attribute("ItemSelected", combo.selected);
            for (i, item) in combo.items.iter().enumerate() {
                let mut child = Element::new(COMBO_ITEM_ELEMENT);
                child.set_attribute(format!("Label_{i}"), &item.label);
                child.set_attribute("UserValue", item.user_value);
                element.push_child(child);
            }
        }
        NodeValue::Vector3(axes) => write_axes(element, axes),
        NodeValue::Vector4(axes) => write_axes(element, axes),
        NodeValue::Rgb(c) | NodeValue::ColorPreview(c) => {
            write_channels(element, RGB_ELEMENT, &[c.red, c.green, c.blue]);
        }
        NodeValue::Rgba(c) => {
            write_channels(element, RGBA_ELEMENT, &[c.red, c.green, c.blue, c.alpha]);
        }
        NodeValue::StaticText(text) | NodeValue::EditText(text) => {
            element.set_attribute("Text", text);
        }
        NodeValue::Spline(knots) => {
            element.set_attribute("NumKnot", knots.len());
            for knot in knots {
                let child = Element::new(SPLINE_KNOT_ELEMENT)
                    .with_attribute("X", knot.x)
                    .with_attribute("Y", knot.y);
                element.push_child(child);
            }
        }
        NodeValue::Matrix3(m) => write_matrix(element, m),
        NodeValue::Matrix4(m) => write_matrix(element, m),
    }
}

fn write_stepped<T: fmt::Display>(element: &mut Element, v: &Stepped<T>) {
    element.set_attribute("Value", &v.value);
    element.set_attribute("Step", &v.step);
    element.set_attribute("MinValue", &v.min);
    element.set_attribute("MaxValue", &v.max);
}

fn write_bounded<T: fmt::Display>(element: &mut Element, v: &Bounded<T>) {
    element.set_attribute("Value", &v.value);
    element.set_attribute("MinValue", &v.min);
    element.set_attribute("MaxValue", &v.max);
}

fn write_axes(element: &mut Element, axes: &[Axis]) {
    for (i, axis) in axes.iter().enumerate() {
        let child = Element::new(VECTOR_ELEMENTS[i])
            .with_attribute("Name", &axis.label)
            .with_attribute(VECTOR_AXES[i], axis.value);
        element.push_child(child);
    }
}

fn write_channels(element: &mut Element, name: &str, values: &[f64]) {
    for (i, value) in values.iter().enumerate() {
        element.push_child(Element::new(name).with_attribute(COLOR_CHANNELS[i], value));
    }
}

fn write_matrix<const N: usize>(element: &mut Element, m: &[[f64; N]; N]) {
    for (i, row) in m.iter().enumerate() {
        let mut child = Element::new(MATRIX_ROWS[i]);
        for (j, cell) in row.iter().enumerate() {
            child.set_attribute(format!("m{i}{j}"), cell);
        }
        element.push_child(child);
    }
}

// ============================================================================
// Decoding: common header
// ============================================================================

/// Attributes shared by every node element.
#[derive(Debug, Clone, PartialEq)]
struct NodeHeader {
    id: NodeId,
    kind: NodeKind,
    name: String,
    enabled: bool,
    visible: bool,
}

fn read_header(element: &Element) -> ProtocolResult<NodeHeader> {
    if element.name() != NODE_ELEMENT {
        return Err(ProtocolError::Malformed(format!(
            "expected <{NODE_ELEMENT}>, found <{}>",
            element.name()
        )));
    }

    let raw_id = element
        .attribute("ID")
        .ok_or_else(|| ProtocolError::MissingAttribute {
            attribute: "ID".into(),
            id: None,
        })?;
    let id = raw_id
        .trim()
        .parse::<u32>()
        .map(NodeId)
        .map_err(|_| ProtocolError::InvalidAttribute {
            attribute: "ID".into(),
            value: raw_id.to_string(),
            id: None,
        })?;

    let attrs = Attrs { element, id };
    let code = attrs.required("Type")?;
    let kind = code
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(NodeKind::from_code)
        .ok_or_else(|| ProtocolError::UnknownKind {
            code: code.to_string(),
            id,
        })?;

    Ok(NodeHeader {
        id,
        kind,
        name: attrs.required("Name")?.to_string(),
        enabled: attrs.flag("Enable")?,
        visible: attrs.flag("Visible")?,
    })
}

/// Attribute reader that knows which node it is reading for diagnostics.
#[derive(Clone, Copy)]
struct Attrs<'a> {
    element: &'a Element,
    id: NodeId,
}

impl<'a> Attrs<'a> {
    fn on(self, element: &'a Element) -> Self {
        Self {
            element,
            id: self.id,
        }
    }

    fn required(&self, name: &str) -> ProtocolResult<&'a str> {
        self.element
            .attribute(name)
            .ok_or_else(|| ProtocolError::MissingAttribute {
                attribute: name.to_string(),
                id: Some(self.id),
            })
    }

    fn parse<T: FromStr>(&self, name: &str) -> ProtocolResult<T> {
        let raw = self.required(name)?;
        raw.trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidAttribute {
                attribute: name.to_string(),
                value: raw.to_string(),
                id: Some(self.id),
            })
    }

    fn flag(&self, name: &str) -> ProtocolResult<bool> {
        Ok(self.parse::<i64>(name)? != 0)
    }

    /// Non-negative count; negative values read as zero.
    fn count(&self, name: &str) -> ProtocolResult<usize> {
        Ok(usize::try_from(self.parse::<i64>(name)?).unwrap_or(0))
    }

    /// Capacity for `count` payload elements. A count larger than the
    /// element's children fails later with `MissingElement`, so it never
    /// needs more room than that.
    fn capacity(&self, count: usize) -> usize {
        count.min(self.element.child_count())
    }

    fn stepped<T: FromStr>(&self) -> ProtocolResult<Stepped<T>> {
        Ok(Stepped {
            value: self.parse("Value")?,
            step: self.parse("Step")?,
            min: self.parse("MinValue")?,
            max: self.parse("MaxValue")?,
        })
    }

    fn bounded<T: FromStr>(&self) -> ProtocolResult<Bounded<T>> {
        Ok(Bounded {
            value: self.parse("Value")?,
            min: self.parse("MinValue")?,
            max: self.parse("MaxValue")?,
        })
    }

    fn child(&self, name: &'static str) -> ProtocolResult<&'a Element> {
        self.element
            .child(name)
            .ok_or(ProtocolError::MissingElement {
                element: name,
                id: self.id,
            })
    }

    /// The `index`-th child named `name`.
    fn nth_child(&self, name: &'static str, index: usize) -> ProtocolResult<&'a Element> {
        self.element
            .children()
            .iter()
            .filter(|child| child.name() == name)
            .nth(index)
            .ok_or(ProtocolError::MissingElement {
                element: name,
                id: self.id,
            })
    }
}

// ============================================================================
// Decoding: payloads
// ============================================================================

/// Decode the payload of a node whose header says `kind`.
///
/// This match is the closed dispatch table from kind to decoder.
fn read_payload(kind: NodeKind, attrs: Attrs<'_>) -> ProtocolResult<NodeValue> {
    let value = match kind {
        NodeKind::Root => NodeValue::Root,
        NodeKind::Folder => NodeValue::Folder,
        NodeKind::Checkbox => NodeValue::Checkbox(attrs.flag("Check")?),
        NodeKind::SpinBoxInt => NodeValue::SpinBoxInt(attrs.stepped()?),
        NodeKind::SpinBoxFloat => NodeValue::SpinBoxFloat(attrs.stepped()?),
        NodeKind::IntValuator => NodeValue::IntValuator(attrs.stepped()?),
        NodeKind::FloatValuator => NodeValue::FloatValuator(attrs.stepped()?),
        NodeKind::Range => NodeValue::Range(attrs.bounded()?),
        NodeKind::RangeInt => NodeValue::RangeInt(attrs.bounded()?),
        NodeKind::Vector3Valuator => NodeValue::Vector3Valuator(VectorValuator {
            x: attrs.parse("X")?,
            y: attrs.parse("Y")?,
            z: attrs.parse("Z")?,
            min: attrs.parse("MinValue")?,
            max: attrs.parse("MaxValue")?,
            step: attrs.parse("Step")?,
        }),
        NodeKind::ComboSimple => NodeValue::ComboSimple(read_combo(attrs)?),
        NodeKind::ComboComplex => NodeValue::ComboComplex(read_combo(attrs)?),
        NodeKind::Vector3 => {
            let [x, y, z] = [0, 1, 2].map(|i| read_axis(attrs, i));
            NodeValue::Vector3([x?, y?, z?])
        }
        NodeKind::Vector4 => {
            let [x, y, z, w] = [0, 1, 2, 3].map(|i| read_axis(attrs, i));
            NodeValue::Vector4([x?, y?, z?, w?])
        }
        NodeKind::Rgb => NodeValue::Rgb(read_rgb(attrs)?),
        NodeKind::ColorPreview => NodeValue::ColorPreview(read_rgb(attrs)?),
        NodeKind::Rgba => NodeValue::Rgba(Rgba {
            red: read_channel(attrs, RGBA_ELEMENT, 0)?,
            green: read_channel(attrs, RGBA_ELEMENT, 1)?,
            blue: read_channel(attrs, RGBA_ELEMENT, 2)?,
            alpha: read_channel(attrs, RGBA_ELEMENT, 3)?,
        }),
        NodeKind::StaticText => NodeValue::StaticText(attrs.required("Text")?.to_string()),
        NodeKind::EditText => NodeValue::EditText(attrs.required("Text")?.to_string()),
        NodeKind::Spline => {
            let count = attrs.count("NumKnot")?;
            let mut knots = Vec::with_capacity(attrs.capacity(count));
            for i in 0..count {
                let knot = attrs.on(attrs.nth_child(SPLINE_KNOT_ELEMENT, i)?);
                knots.push(Knot {
                    x: knot.parse("X")?,
                    y: knot.parse("Y")?,
                });
            }
            NodeValue::Spline(knots)
        }
        NodeKind::Matrix3Preview => NodeValue::Matrix3(read_matrix(attrs)?),
        NodeKind::Matrix4Preview => NodeValue::Matrix4(read_matrix(attrs)?),
    };
    tracing::trace!(target: targets::PROTOCOL, id = %attrs.id, %kind, "decoded payload");
    Ok(value)
}

fn read_combo(attrs: Attrs<'_>) -> ProtocolResult<Combo> {
    let count = attrs.count("NumItem")?;
    let selected = attrs.count("ItemSelected")?;
    let mut items = Vec::with_capacity(attrs.capacity(count));
    for i in 0..count {
        let item = attrs.on(attrs.nth_child(COMBO_ITEM_ELEMENT, i)?);
        items.push(ComboItem {
            label: item.required(&format!("Label_{i}"))?.to_string(),
            user_value: item.parse("UserValue")?,
        });
    }
    Ok(Combo { items, selected })
}

fn read_axis(attrs: Attrs<'_>, index: usize) -> ProtocolResult<Axis> {
    let axis = attrs.on(attrs.child(VECTOR_ELEMENTS[index])?);
    let value = axis.parse(VECTOR_AXES[index])?;
    let label = match axis.element.attribute("Name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => VECTOR_AXES[index].to_string(),
    };
    Ok(Axis { label, value })
}

fn read_channel(attrs: Attrs<'_>, element: &'static str, index: usize) -> ProtocolResult<f64> {
    attrs
        .on(attrs.nth_child(element, index)?)
        .parse(COLOR_CHANNELS[index])
}

fn read_rgb(attrs: Attrs<'_>) -> ProtocolResult<Rgb> {
    Ok(Rgb {
        red: read_channel(attrs, RGB_ELEMENT, 0)?,
        green: read_channel(attrs, RGB_ELEMENT, 1)?,
        blue: read_channel(attrs, RGB_ELEMENT, 2)?,
    })
}

fn read_matrix<const N: usize>(attrs: Attrs<'_>) -> ProtocolResult<[[f64; N]; N]> {
    let mut m = [[0.0; N]; N];
    for (i, row) in m.iter_mut().enumerate() {
        let row_attrs = attrs.on(attrs.child(MATRIX_ROWS[i])?);
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = row_attrs.parse(&format!("m{i}{j}"))?;
        }
    }
    Ok(m)
}

// ============================================================================
// Decoding: create
// ============================================================================

/// A validated node waiting to be inserted.
struct PendingNode {
    node: SyncNode,
    children: Vec<PendingNode>,
}

impl PendingNode {
    fn count(&self) -> usize {
        1 + self.children.iter().map(PendingNode::count).sum::<usize>()
    }
}

fn plan_create(
    element: &Element,
    ids: &SharedIdGenerator,
    taken: &mut HashSet<NodeId>,
) -> ProtocolResult<PendingNode> {
    let header = read_header(element)?;
    if !ids.can_reserve(header.id) {
        return Err(ProtocolError::InvalidAttribute {
            attribute: "ID".into(),
            value: header.id.to_string(),
            id: Some(header.id),
        });
    }
    if !taken.insert(header.id) {
        return Err(ProtocolError::DuplicateId { id: header.id });
    }
    let attrs = Attrs {
        element,
        id: header.id,
    };
    let value = read_payload(header.kind, attrs)?;

    let mut children = Vec::new();
    if !header.kind.skip_children() {
        for child in element.children() {
            children.push(plan_create(child, ids, taken)?);
        }
    }

    let mut node = SyncNode::new(header.id, header.name, value);
    node.set_enabled(header.enabled);
    node.set_visible(header.visible);
    Ok(PendingNode { node, children })
}

impl SyncForest {
    fn build(&mut self, pending: PendingNode) -> NodeKey {
        let key = self.insert_with_id(pending.node);
        for child in pending.children {
            let child_key = self.build(child);
            self.push_back(key, child_key);
        }
        key
    }
}

// ============================================================================
// Decoding: patch
// ============================================================================

/// A validated update for one existing node.
struct PatchUpdate {
    key: NodeKey,
    name: String,
    enabled: bool,
    visible: bool,
    value: NodeValue,
}

impl PatchUpdate {
    /// Apply to `node`, returning whether anything changed.
    fn apply(self, node: &mut SyncNode) -> bool {
        let changed = node.name() != self.name
            || node.is_enabled() != self.enabled
            || node.is_visible() != self.visible
            || *node.value() != self.value;
        node.set_name(self.name);
        node.set_enabled(self.enabled);
        node.set_visible(self.visible);
        node.set_value(self.value);
        changed
    }
}

impl SyncForest {
    fn plan_patch(
        &self,
        key: NodeKey,
        element: &Element,
        header: NodeHeader,
        plan: &mut Vec<PatchUpdate>,
    ) -> ProtocolResult<()> {
        let Some(node) = self.node(key) else {
            return Err(ProtocolError::UnknownNodeId { id: header.id });
        };
        if node.kind() != header.kind {
            return Err(ProtocolError::KindMismatch {
                id: header.id,
                expected: node.kind(),
                found: header.kind,
            });
        }

        let attrs = Attrs {
            element,
            id: header.id,
        };
        let value = read_payload(header.kind, attrs)?;
        plan.push(PatchUpdate {
            key,
            name: header.name,
            enabled: header.enabled,
            visible: header.visible,
            value,
        });

        if !header.kind.skip_children() {
            for child in element.children() {
                let child_header = read_header(child)?;
                // Strictly below `key`: an element repeating its parent's ID
                // must not patch the parent twice.
                let child_key = self
                    .descendants(key)
                    .find(|&descendant| self.id_of(descendant) == Some(child_header.id))
                    .ok_or(ProtocolError::UnknownNodeId {
                        id: child_header.id,
                    })?;
                self.plan_patch(child_key, child, child_header, plan)?;
            }
        }
        Ok(())
    }
}
