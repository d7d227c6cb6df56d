//! Kind-specific payloads carried by synchronized nodes.
//!
//! [`NodeValue`] is a closed sum type with one variant per [`NodeKind`], so
//! adding a kind forces every encoder, decoder and painter match to be
//! revisited.

use std::fmt::Write as _;

use crate::kind::NodeKind;

/// A numeric value with a step and an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stepped<T> {
    pub value: T,
    pub step: T,
    pub min: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> Stepped<T> {
    pub fn new(value: T, step: T, min: T, max: T) -> Self {
        Self {
            value,
            step,
            min,
            max,
        }
    }

    /// Store `value` clamped to `min..=max`.
    pub fn set_value(&mut self, value: T) {
        self.value = clamp(value, self.min, self.max);
    }
}

/// A numeric value with an inclusive range and no step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounded<T> {
    pub value: T,
    pub min: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> Bounded<T> {
    pub fn new(value: T, min: T, max: T) -> Self {
        Self { value, min, max }
    }

    /// Store `value` clamped to `min..=max`.
    pub fn set_value(&mut self, value: T) {
        self.value = clamp(value, self.min, self.max);
    }
}

fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// One entry of a combo box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboItem {
    pub label: String,
    pub user_value: i32,
}

impl ComboItem {
    pub fn new(label: impl Into<String>, user_value: i32) -> Self {
        Self {
            label: label.into(),
            user_value,
        }
    }
}

/// Items and current selection of a combo box.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Combo {
    pub items: Vec<ComboItem>,
    pub selected: usize,
}

impl Combo {
    pub fn new(items: Vec<ComboItem>, selected: usize) -> Self {
        Self { items, selected }
    }

    /// The selected item, if the index is in range.
    pub fn selected_item(&self) -> Option<&ComboItem> {
        self.items.get(self.selected)
    }
}

/// A labelled vector component.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub value: f64,
}

impl Axis {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A three-component vector edited through one shared range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorValuator {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Color with alpha, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

/// A spline control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knot {
    pub x: f64,
    pub y: f64,
}

/// Payload of a synchronized node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Root,
    Folder,
    Checkbox(bool),
    SpinBoxInt(Stepped<i32>),
    SpinBoxFloat(Stepped<f64>),
    ComboSimple(Combo),
    ComboComplex(Combo),
    Vector3([Axis; 3]),
    Vector4([Axis; 4]),
    Rgb(Rgb),
    Rgba(Rgba),
    StaticText(String),
    Spline(Vec<Knot>),
    EditText(String),
    Range(Bounded<f64>),
    RangeInt(Bounded<i32>),
    IntValuator(Stepped<i32>),
    FloatValuator(Stepped<f64>),
    Vector3Valuator(VectorValuator),
    ColorPreview(Rgb),
    Matrix3([[f64; 3]; 3]),
    Matrix4([[f64; 4]; 4]),
}

impl NodeValue {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeValue::Root => NodeKind::Root,
            NodeValue::Folder => NodeKind::Folder,
            NodeValue::Checkbox(_) => NodeKind::Checkbox,
            NodeValue::SpinBoxInt(_) => NodeKind::SpinBoxInt,
            NodeValue::SpinBoxFloat(_) => NodeKind::SpinBoxFloat,
            NodeValue::ComboSimple(_) => NodeKind::ComboSimple,
            NodeValue::ComboComplex(_) => NodeKind::ComboComplex,
            NodeValue::Vector3(_) => NodeKind::Vector3,
            NodeValue::Vector4(_) => NodeKind::Vector4,
            NodeValue::Rgb(_) => NodeKind::Rgb,
            NodeValue::Rgba(_) => NodeKind::Rgba,
            NodeValue::StaticText(_) => NodeKind::StaticText,
            NodeValue::Spline(_) => NodeKind::Spline,
            NodeValue::EditText(_) => NodeKind::EditText,
            NodeValue::Range(_) => NodeKind::Range,
            NodeValue::RangeInt(_) => NodeKind::RangeInt,
            NodeValue::IntValuator(_) => NodeKind::IntValuator,
            NodeValue::FloatValuator(_) => NodeKind::FloatValuator,
            NodeValue::Vector3Valuator(_) => NodeKind::Vector3Valuator,
            NodeValue::ColorPreview(_) => NodeKind::ColorPreview,
            NodeValue::Matrix3(_) => NodeKind::Matrix3Preview,
            NodeValue::Matrix4(_) => NodeKind::Matrix4Preview,
        }
    }

    /// The payload a freshly constructed node of `kind` starts with.
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Root => NodeValue::Root,
            NodeKind::Folder => NodeValue::Folder,
            NodeKind::Checkbox => NodeValue::Checkbox(false),
            NodeKind::SpinBoxInt => NodeValue::SpinBoxInt(Stepped::new(0, 1, 0, 100)),
            NodeKind::SpinBoxFloat => NodeValue::SpinBoxFloat(Stepped::new(0.0, 0.1, 0.0, 1.0)),
            NodeKind::ComboSimple => NodeValue::ComboSimple(Combo::default()),
            NodeKind::ComboComplex => NodeValue::ComboComplex(Combo::default()),
            NodeKind::Vector3 => NodeValue::Vector3([
                Axis::new("X", 0.0),
                Axis::new("Y", 0.0),
                Axis::new("Z", 0.0),
            ]),
            NodeKind::Vector4 => NodeValue::Vector4([
                Axis::new("X", 0.0),
                Axis::new("Y", 0.0),
                Axis::new("Z", 0.0),
                Axis::new("W", 0.0),
            ]),
            NodeKind::Rgb => NodeValue::Rgb(Rgb::default()),
            NodeKind::Rgba => NodeValue::Rgba(Rgba {
                red: 0.0,
                green: 0.0,
                blue: 0.0,
                alpha: 1.0,
            }),
            NodeKind::StaticText => NodeValue::StaticText(String::new()),
            NodeKind::Spline => NodeValue::Spline(vec![Knot { x: 0.0, y: 0.0 }, Knot { x: 1.0, y: 1.0 }]),
            NodeKind::EditText => NodeValue::EditText(String::new()),
            NodeKind::Range => NodeValue::Range(Bounded::new(0.0, 0.0, 1.0)),
            NodeKind::RangeInt => NodeValue::RangeInt(Bounded::new(0, 0, 100)),
            NodeKind::IntValuator => NodeValue::IntValuator(Stepped::new(0, 1, 0, 100)),
            NodeKind::FloatValuator => NodeValue::FloatValuator(Stepped::new(0.0, 0.1, 0.0, 1.0)),
            NodeKind::Vector3Valuator => NodeValue::Vector3Valuator(VectorValuator {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                min: 0.0,
                max: 1.0,
                step: 0.1,
            }),
            NodeKind::ColorPreview => NodeValue::ColorPreview(Rgb::default()),
            NodeKind::Matrix3Preview => NodeValue::Matrix3(identity()),
            NodeKind::Matrix4Preview => NodeValue::Matrix4(identity()),
        }
    }

    /// Short summary shown in a table's value column.
    pub fn display_text(&self) -> String {
        match self {
            NodeValue::Root | NodeValue::Folder => String::new(),
            NodeValue::Checkbox(checked) => (if *checked { "on" } else { "off" }).to_string(),
            NodeValue::SpinBoxInt(v) | NodeValue::IntValuator(v) => v.value.to_string(),
            NodeValue::SpinBoxFloat(v) | NodeValue::FloatValuator(v) => v.value.to_string(),
            NodeValue::Range(v) => v.value.to_string(),
            NodeValue::RangeInt(v) => v.value.to_string(),
            NodeValue::ComboSimple(combo) | NodeValue::ComboComplex(combo) => combo
                .selected_item()
                .map(|item| item.label.clone())
                .unwrap_or_default(),
            NodeValue::Vector3(axes) => tuple_text(axes.iter().map(|a| a.value)),
            NodeValue::Vector4(axes) => tuple_text(axes.iter().map(|a| a.value)),
            NodeValue::Vector3Valuator(v) => tuple_text([v.x, v.y, v.z]),
            NodeValue::Rgb(c) | NodeValue::ColorPreview(c) => hex_text(&[c.red, c.green, c.blue]),
            NodeValue::Rgba(c) => hex_text(&[c.red, c.green, c.blue, c.alpha]),
            NodeValue::StaticText(text) | NodeValue::EditText(text) => text.clone(),
            NodeValue::Spline(knots) => format!("{} knots", knots.len()),
            NodeValue::Matrix3(_) => "3x3 matrix".to_string(),
            NodeValue::Matrix4(_) => "4x4 matrix".to_string(),
        }
    }
}

fn identity<const N: usize>() -> [[f64; N]; N] {
    let mut m = [[0.0; N]; N];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

fn tuple_text(values: impl IntoIterator<Item = f64>) -> String {
    let parts: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    format!("({})", parts.join(", "))
}

fn hex_text(components: &[f64]) -> String {
    let mut out = String::from("#");
    for c in components {
        let byte = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        let _ = write!(out, "{byte:02X}");
    }
    out
}

static_assertions::assert_impl_all!(NodeValue: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload_matches_kind() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeValue::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_stepped_set_value_clamps() {
        let mut spin = Stepped::new(5, 1, 0, 10);
        spin.set_value(42);
        assert_eq!(spin.value, 10);
        spin.set_value(-3);
        assert_eq!(spin.value, 0);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(NodeValue::Checkbox(true).display_text(), "on");
        assert_eq!(
            NodeValue::Rgb(Rgb {
                red: 1.0,
                green: 0.0,
                blue: 0.5
            })
            .display_text(),
            "#FF0080"
        );
        let combo = Combo::new(vec![ComboItem::new("low", 1), ComboItem::new("high", 2)], 1);
        assert_eq!(NodeValue::ComboSimple(combo).display_text(), "high");
        assert_eq!(
            NodeValue::default_for(NodeKind::Vector3).display_text(),
            "(0, 0, 0)"
        );
    }

    #[test]
    fn test_identity_matrix() {
        let NodeValue::Matrix3(m) = NodeValue::default_for(NodeKind::Matrix3Preview) else {
            panic!("wrong payload");
        };
        assert_eq!(m[0], [1.0, 0.0, 0.0]);
        assert_eq!(m[2], [0.0, 0.0, 1.0]);
    }
}
