// src/display/canvas.rs
//! 2D drawing surface abstraction
//!
//! The scatter engine draws through these primitives so it can target any
//! rendering backend. [`RecordingCanvas`] captures the emitted primitives
//! for inspection in tests; [`NullCanvas`] discards them for headless runs.

/// Simple RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Grid lines, rings and labels
pub const FOREGROUND: Color = Color::rgb(200, 200, 200);
/// Scatter points and statistics text
pub const POINT: Color = Color::rgb(255, 165, 0);
/// Fixed reference marker
pub const FIXED: Color = Color::rgb(0, 230, 118);

/// Text anchor relative to the given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    North,
    South,
    East,
    West,
    NorthWest,
}

/// Minimal drawing surface: lines, circles and text on a pixel grid whose
/// y axis grows downward.
pub trait Canvas {
    /// Current surface size as (width, height) in pixels
    fn size(&self) -> (f64, f64);

    /// Erase everything
    fn clear(&mut self);

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color);

    fn circle(&mut self, center: (f64, f64), radius: f64, color: Color, fill: bool);

    fn text(&mut self, pos: (f64, f64), text: &str, color: Color, anchor: Anchor);
}

/// A primitive captured by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Color,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        color: Color,
        fill: bool,
    },
    Text {
        pos: (f64, f64),
        text: String,
        color: Color,
        anchor: Anchor,
    },
}

/// Canvas that records every primitive drawn on it.
#[derive(Debug)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    pub primitives: Vec<Primitive>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            primitives: Vec::new(),
        }
    }

    pub fn circles(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Circle { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.primitives.clear();
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) {
        self.primitives.push(Primitive::Line { from, to, color });
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, color: Color, fill: bool) {
        self.primitives.push(Primitive::Circle {
            center,
            radius,
            color,
            fill,
        });
    }

    fn text(&mut self, pos: (f64, f64), text: &str, color: Color, anchor: Anchor) {
        self.primitives.push(Primitive::Text {
            pos,
            text: text.to_string(),
            color,
            anchor,
        });
    }
}

/// Canvas with a nominal size that discards all drawing.
#[derive(Debug)]
pub struct NullCanvas {
    width: f64,
    height: f64,
}

impl NullCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for NullCanvas {
    fn default() -> Self {
        Self::new(500.0, 500.0)
    }
}

impl Canvas for NullCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {}

    fn line(&mut self, _from: (f64, f64), _to: (f64, f64), _color: Color) {}

    fn circle(&mut self, _center: (f64, f64), _radius: f64, _color: Color, _fill: bool) {}

    fn text(&mut self, _pos: (f64, f64), _text: &str, _color: Color, _anchor: Anchor) {}
}
