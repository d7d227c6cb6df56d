//! The drawing surface the engines paint onto.
//!
//! The engines never talk to a window system or GPU. They issue a short list
//! of primitive commands against a [`Painter`] supplied by the embedding UI.

use crate::geometry::{Color, Point, Rect};

/// A font request. How it maps onto a real typeface is up to the painter.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("sans-serif", 12.0)
    }
}

/// A 2D drawing surface.
///
/// Clips nest: every [`push_clip`](Painter::push_clip) is matched by a
/// [`pop_clip`](Painter::pop_clip), and drawing is restricted to the
/// intersection of all active clips.
pub trait Painter {
    // =========================================================================
    // Drawing
    // =========================================================================

    /// Fill `rect` with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw a single line of text with its top-left corner at `origin`.
    fn draw_text(&mut self, origin: Point, text: &str, font: &Font, color: Color);

    // =========================================================================
    // Clipping
    // =========================================================================

    fn push_clip(&mut self, rect: Rect);

    fn pop_clip(&mut self);
}

/// One recorded [`Painter`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect(Rect, Color),
    DrawText {
        origin: Point,
        text: String,
        font: Font,
        color: Color,
    },
    PushClip(Rect),
    PopClip,
}

/// A painter that records every call, for headless rendering and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    commands: Vec<PaintCommand>,
    clip_depth: usize,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// The text of every `DrawText` call, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                PaintCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of clips pushed and not yet popped.
    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.clip_depth = 0;
    }
}

impl Painter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect(rect, color));
    }

    fn draw_text(&mut self, origin: Point, text: &str, font: &Font, color: Color) {
        self.commands.push(PaintCommand::DrawText {
            origin,
            text: text.to_string(),
            font: font.clone(),
            color,
        });
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clip_depth += 1;
        self.commands.push(PaintCommand::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.clip_depth = self.clip_depth.saturating_sub(1);
        self.commands.push(PaintCommand::PopClip);
    }
}
