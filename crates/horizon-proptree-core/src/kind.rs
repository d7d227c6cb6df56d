//! The closed set of node kinds.

use std::fmt;

/// Border added above and below a property widget when computing row height.
pub const PROPERTY_BORDER_Y: u32 = 2;

/// Height of a single-line property widget.
const WIDGET_HEIGHT: u32 = 16;

/// The variant of a synchronized node.
///
/// The kind is fixed at construction and selects the payload, the wire
/// attributes and the decoder used for the node. Discriminants are the `Type`
/// codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum NodeKind {
    /// Invisible sentinel at the top of a table.
    Root = 1,
    #[default]
    Folder = 2,
    Checkbox = 4,
    SpinBoxInt = 5,
    SpinBoxFloat = 6,
    ComboSimple = 7,
    ComboComplex = 8,
    Vector3 = 9,
    Vector4 = 10,
    Rgb = 11,
    Rgba = 12,
    StaticText = 13,
    Spline = 14,
    EditText = 15,
    Range = 16,
    RangeInt = 17,
    IntValuator = 18,
    FloatValuator = 19,
    Vector3Valuator = 20,
    ColorPreview = 21,
    Matrix4Preview = 22,
    Matrix3Preview = 23,
}

impl NodeKind {
    /// Every kind, in wire-code order.
    pub const ALL: [NodeKind; 22] = [
        NodeKind::Root,
        NodeKind::Folder,
        NodeKind::Checkbox,
        NodeKind::SpinBoxInt,
        NodeKind::SpinBoxFloat,
        NodeKind::ComboSimple,
        NodeKind::ComboComplex,
        NodeKind::Vector3,
        NodeKind::Vector4,
        NodeKind::Rgb,
        NodeKind::Rgba,
        NodeKind::StaticText,
        NodeKind::Spline,
        NodeKind::EditText,
        NodeKind::Range,
        NodeKind::RangeInt,
        NodeKind::IntValuator,
        NodeKind::FloatValuator,
        NodeKind::Vector3Valuator,
        NodeKind::ColorPreview,
        NodeKind::Matrix4Preview,
        NodeKind::Matrix3Preview,
    ];

    /// The `Type` code written on the wire.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a kind by wire code. Code 3 is reserved and has no kind.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    /// The informational `TypeString` attribute.
    pub fn type_string(self) -> &'static str {
        match self {
            NodeKind::Root => "ROOT_NODE",
            NodeKind::Folder => "Folder",
            NodeKind::Checkbox => "Check",
            NodeKind::SpinBoxInt => "SpinBox",
            NodeKind::SpinBoxFloat => "DoubleSpinBox",
            NodeKind::ComboSimple => "ComboBoxSimple",
            NodeKind::ComboComplex => "ComboBoxComplex",
            NodeKind::Vector3 => "Vector3",
            NodeKind::Vector4 => "Vector4",
            NodeKind::Rgb => "RGB",
            NodeKind::Rgba => "RGBA",
            NodeKind::StaticText => "StaticText",
            NodeKind::Spline => "Spline",
            NodeKind::EditText => "EditText",
            NodeKind::Range => "RangeValue",
            NodeKind::RangeInt => "RangeValueInteger",
            NodeKind::IntValuator => "IntValuator",
            NodeKind::FloatValuator => "DoubleValuator",
            NodeKind::Vector3Valuator => "Vector3Valuator",
            NodeKind::ColorPreview => "ColorPreview",
            NodeKind::Matrix4Preview => "Matrix4Preview",
            NodeKind::Matrix3Preview => "Matrix3Preview",
        }
    }

    /// Whether nodes of this kind encode their own nested structure as
    /// payload elements instead of exposing generic child nodes.
    pub fn skip_children(self) -> bool {
        matches!(
            self,
            NodeKind::ComboSimple
                | NodeKind::ComboComplex
                | NodeKind::Vector3
                | NodeKind::Vector4
                | NodeKind::Rgb
                | NodeKind::Rgba
                | NodeKind::ColorPreview
                | NodeKind::Spline
                | NodeKind::Matrix3Preview
                | NodeKind::Matrix4Preview
        )
    }

    /// Preferred row height, or `None` to use the table default.
    pub fn best_height(self) -> Option<u32> {
        let border = 2 * PROPERTY_BORDER_Y;
        match self {
            NodeKind::Root | NodeKind::Folder | NodeKind::StaticText | NodeKind::EditText => None,
            NodeKind::Spline => Some(48 + border),
            NodeKind::Matrix3Preview => Some(3 * WIDGET_HEIGHT + border),
            NodeKind::Matrix4Preview => Some(4 * WIDGET_HEIGHT + border),
            _ => Some(WIDGET_HEIGHT + border),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_string())
    }
}
