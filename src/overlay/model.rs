use crate::overlay::error::OverlayError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LINE_WIDTH: f64 = 15.0;
pub const DEFAULT_ARROWHEAD_WIDTH: f64 = 55.0;
pub const DEFAULT_ARROWHEAD_HEIGHT: f64 = 45.0;
pub const DEFAULT_TAIL_INSET: f64 = 20.0;

/// Which side of the board is drawn nearest to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Rank 1 along the bottom row, file `a` in the leftmost column.
    #[default]
    Primary,
    /// Both axes inverted: rank 1 along the top row, file `a` on the right.
    Flipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSpec {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

impl GridSpec {
    pub fn new(width: u32, height: u32, orientation: Orientation) -> Result<Self, OverlayError> {
        let spec = Self {
            width,
            height,
            orientation,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.width == 0 || self.height == 0 {
            return Err(OverlayError::InvalidGrid {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn contains(&self, address: CellAddress) -> bool {
        (1..=self.width).contains(&address.col) && (1..=self.height).contains(&address.row)
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// 1-based cell coordinates in row-major pixel order: `(1, 1)` is the top-left slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for CellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Bounding rectangle of the host element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostRect {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl HostRect {
    pub const fn new(width: f64, height: f64, left: f64, top: f64) -> Self {
        Self {
            width,
            height,
            left,
            top,
        }
    }

    /// A rectangle whose every measured field is zero, as reported for an
    /// element that has been removed from the page.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 && self.height == 0.0 && self.left == 0.0 && self.top == 0.0
    }
}

/// Arrow proportions in hundredths of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowStyle {
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default = "default_arrowhead_width")]
    pub arrowhead_width: f64,
    #[serde(default = "default_arrowhead_height")]
    pub arrowhead_height: f64,
    #[serde(default = "default_tail_inset")]
    pub tail_inset: f64,
    /// Passed through untouched as the primitive's style attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_style: Option<String>,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
            arrowhead_width: DEFAULT_ARROWHEAD_WIDTH,
            arrowhead_height: DEFAULT_ARROWHEAD_HEIGHT,
            tail_inset: DEFAULT_TAIL_INSET,
            visual_style: None,
        }
    }
}

impl ArrowStyle {
    pub fn with_visual_style(mut self, style: impl Into<String>) -> Self {
        self.visual_style = Some(style.into());
        self
    }
}

fn default_line_width() -> f64 {
    DEFAULT_LINE_WIDTH
}

fn default_arrowhead_width() -> f64 {
    DEFAULT_ARROWHEAD_WIDTH
}

fn default_arrowhead_height() -> f64 {
    DEFAULT_ARROWHEAD_HEIGHT
}

fn default_tail_inset() -> f64 {
    DEFAULT_TAIL_INSET
}

/// An arrow endpoint, either by algebraic label or by grid slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Label(String),
    Address(CellAddress),
}

impl From<&str> for Endpoint {
    fn from(label: &str) -> Self {
        Self::Label(label.to_owned())
    }
}

impl From<String> for Endpoint {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<CellAddress> for Endpoint {
    fn from(address: CellAddress) -> Self {
        Self::Address(address)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label(label) => f.write_str(label),
            Self::Address(address) => address.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Arrow,
    Marker,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSpec {
    Arrow {
        from: Endpoint,
        to: Endpoint,
        style: ArrowStyle,
    },
    Marker {
        at: PixelPoint,
    },
}

impl ShapeSpec {
    pub fn arrow(from: impl Into<Endpoint>, to: impl Into<Endpoint>, style: ArrowStyle) -> Self {
        Self::Arrow {
            from: from.into(),
            to: to.into(),
            style,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Arrow { .. } => ShapeKind::Arrow,
            Self::Marker { .. } => ShapeKind::Marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            GridSpec::new(0, 8, Orientation::Primary),
            Err(OverlayError::InvalidGrid {
                width: 0,
                height: 8
            })
        );
        assert!(GridSpec::new(8, 0, Orientation::Flipped).is_err());
        assert!(GridSpec::new(1, 1, Orientation::Primary).is_ok());
    }

    #[test]
    fn grid_contains_only_one_based_in_range_addresses() {
        let grid = GridSpec::new(8, 6, Orientation::Primary).unwrap();
        assert!(grid.contains(CellAddress::new(1, 1)));
        assert!(grid.contains(CellAddress::new(8, 6)));
        assert!(!grid.contains(CellAddress::new(0, 1)));
        assert!(!grid.contains(CellAddress::new(8, 7)));
    }

    #[test]
    fn only_all_zero_rect_is_degenerate() {
        assert!(HostRect::default().is_degenerate());
        assert!(!HostRect::new(0.0, 0.0, 12.0, 0.0).is_degenerate());
        assert!(!HostRect::new(800.0, 800.0, 0.0, 0.0).is_degenerate());
    }

    #[test]
    fn arrow_style_fills_missing_fields_with_defaults() {
        let style: ArrowStyle = serde_json::from_str(r#"{"line_width": 10.0}"#).unwrap();
        assert_eq!(style.line_width, 10.0);
        assert_eq!(style.arrowhead_width, DEFAULT_ARROWHEAD_WIDTH);
        assert_eq!(style.arrowhead_height, DEFAULT_ARROWHEAD_HEIGHT);
        assert_eq!(style.tail_inset, DEFAULT_TAIL_INSET);
        assert_eq!(style.visual_style, None);
    }
}
