//! GUI widgets: the native atom boxes and the IEM GUI family.
//!
//! Widget fields are kept as the ordered list of unescaped atoms following
//! the position. Only the handful of fields needed to estimate a widget's
//! on-screen size are interpreted.

use serde::{Deserialize, Serialize};

use crate::{atom::decode_number, geometry::Size};

/// The kind of a GUI widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetKind {
    FloatAtom,
    SymbolAtom,
    ListBox,
    Bang,
    Toggle,
    NumberBox,
    VerticalSlider,
    HorizontalSlider,
    VerticalRadio,
    HorizontalRadio,
    VuMeter,
    Canvas,
}

impl WidgetKind {
    /// Look up the widget kind for a class name.
    pub fn from_class(class: &str) -> Option<Self> {
        let kind = match class {
            "floatatom" => Self::FloatAtom,
            "symbolatom" => Self::SymbolAtom,
            "listbox" => Self::ListBox,
            "bng" => Self::Bang,
            "tgl" => Self::Toggle,
            "nbx" | "my_numbox" => Self::NumberBox,
            "vsl" | "vslider" => Self::VerticalSlider,
            "hsl" | "hslider" => Self::HorizontalSlider,
            "vradio" | "vdl" | "rdb" | "radiobut" | "radiobutton" => Self::VerticalRadio,
            "hradio" | "hdl" => Self::HorizontalRadio,
            "vu" => Self::VuMeter,
            "cnv" | "my_canvas" => Self::Canvas,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` for widgets written with their own statement keyword
    /// (`#X floatatom ...`) rather than as an object (`#X obj ... tgl`).
    pub fn is_native(self) -> bool {
        matches!(self, Self::FloatAtom | Self::SymbolAtom | Self::ListBox)
    }
}

/// A GUI widget node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    kind: WidgetKind,
    class: String,
    fields: Vec<String>,
}

impl Widget {
    /// Create a widget from its class name, or `None` if the class is not a
    /// widget.
    pub fn new(class: impl Into<String>, fields: Vec<String>) -> Option<Self> {
        let class = class.into();
        let kind = WidgetKind::from_class(&class)?;
        Some(Self {
            kind,
            class,
            fields,
        })
    }

    /// A number box without fields.
    pub(crate) fn empty() -> Self {
        Self {
            kind: WidgetKind::FloatAtom,
            class: "floatatom".to_string(),
            fields: Vec::new(),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// The class name as written in the patch.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The kind-specific fields, unescaped, in statement order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The size the widget declares through its fields, if any.
    pub fn declared_size(&self, font: f32) -> Option<Size> {
        let field = |index: usize| self.fields.get(index).and_then(|f| decode_number(f));
        match self.kind {
            WidgetKind::Bang | WidgetKind::Toggle => {
                let side = field(0)?;
                Some(Size::new(side, side))
            }
            WidgetKind::VerticalSlider | WidgetKind::HorizontalSlider | WidgetKind::VuMeter => {
                Some(Size::new(field(0)?, field(1)?))
            }
            WidgetKind::VerticalRadio => {
                let side = field(0)?;
                Some(Size::new(side, side * field(3)?.max(1.0)))
            }
            WidgetKind::HorizontalRadio => {
                let side = field(0)?;
                Some(Size::new(side * field(3)?.max(1.0), side))
            }
            WidgetKind::Canvas => Some(Size::new(field(1)?, field(2)?)),
            WidgetKind::NumberBox => {
                let height = field(1)?;
                Some(Size::new(field(0)? * font / 2.0 + height / 2.0, height))
            }
            WidgetKind::FloatAtom | WidgetKind::SymbolAtom | WidgetKind::ListBox => {
                let chars = match field(0)? {
                    width if width > 0.0 => width,
                    _ => 5.0,
                };
                Some(Size::new(chars * font / 2.0 + 2.0, font * 2.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn fields(text: &str) -> Vec<String> {
        text.split(' ').map(str::to_string).collect()
    }

    #[test]
    fn test_from_class() {
        assert_eq!(WidgetKind::from_class("tgl"), Some(WidgetKind::Toggle));
        assert_eq!(WidgetKind::from_class("my_canvas"), Some(WidgetKind::Canvas));
        assert_eq!(WidgetKind::from_class("osc~"), None);
        assert!(WidgetKind::FloatAtom.is_native());
        assert!(!WidgetKind::Bang.is_native());
    }

    #[test]
    fn test_toggle_size() {
        let args = fields("15 0 empty empty empty 17 7 0 10 #fcfcfc #000000 #000000 0 1");
        let tgl = Widget::new("tgl", args).unwrap();
        let size = tgl.declared_size(12.0).unwrap();
        assert_approx_eq!(f32, size.width(), 15.0);
        assert_approx_eq!(f32, size.height(), 15.0);
    }

    #[test]
    fn test_canvas_size() {
        let args = fields("15 100 60 empty empty empty 20 12 0 14 #e0e0e0 #404040 0");
        let cnv = Widget::new("cnv", args).unwrap();
        let size = cnv.declared_size(12.0).unwrap();
        assert_approx_eq!(f32, size.width(), 100.0);
        assert_approx_eq!(f32, size.height(), 60.0);
    }

    #[test]
    fn test_radio_size_counts_cells() {
        let args = fields("15 1 0 8 empty empty empty 0 -8 0 10 #fcfcfc #000000 #000000 0");
        let radio = Widget::new("hradio", args).unwrap();
        let size = radio.declared_size(12.0).unwrap();
        assert_approx_eq!(f32, size.width(), 120.0);
        assert_approx_eq!(f32, size.height(), 15.0);
    }

    #[test]
    fn test_missing_fields_have_no_size() {
        let bng = Widget::new("bng", vec![]).unwrap();
        assert!(bng.declared_size(12.0).is_none());
        assert!(Widget::new("metro", vec![]).is_none());
    }
}
