use crate::overlay::error::OverlayError;
use crate::overlay::model::{ArrowStyle, GridSpec, Orientation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when the host element's rectangle collapses to all zeros.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisappearancePolicy {
    /// Tear the overlay down the first time the board disappears.
    Terminate,
    /// Keep the last geometry and resume once the board measures again.
    Retain,
}

/// Overlay configuration. `disappearance` has no default and must be chosen
/// by the embedder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlaySettings {
    #[serde(default = "default_grid_width")]
    pub grid_width: u32,
    #[serde(default = "default_grid_height")]
    pub grid_height: u32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_layer")]
    pub layer: i32,
    pub disappearance: DisappearancePolicy,
    #[serde(default)]
    pub debug_markers: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_watch_ancestor")]
    pub watch_ancestor: bool,
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub arrow_style: ArrowStyle,
}

fn default_grid_width() -> u32 {
    8
}

fn default_grid_height() -> u32 {
    8
}

fn default_layer() -> i32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_watch_ancestor() -> bool {
    true
}

fn default_fill_color() -> String {
    "mediumseagreen".to_owned()
}

fn default_opacity() -> f64 {
    0.8
}

impl OverlaySettings {
    pub fn new(disappearance: DisappearancePolicy) -> Self {
        Self {
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            orientation: Orientation::default(),
            layer: default_layer(),
            disappearance,
            debug_markers: false,
            poll_interval_ms: default_poll_interval_ms(),
            watch_ancestor: default_watch_ancestor(),
            fill_color: default_fill_color(),
            opacity: default_opacity(),
            arrow_style: ArrowStyle::default(),
        }
    }

    pub fn grid(&self) -> Result<GridSpec, OverlayError> {
        GridSpec::new(self.grid_width, self.grid_height, self.orientation)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_visual_style(&self) -> String {
        format!("fill: {}; opacity: {}", self.fill_color, self.opacity)
    }

    /// Arrow style used when a caller does not pass one.
    pub fn resolved_arrow_style(&self, style: Option<ArrowStyle>) -> ArrowStyle {
        let mut style = style.unwrap_or_else(|| self.arrow_style.clone());
        if style.visual_style.is_none() {
            style.visual_style = Some(self.default_visual_style());
        }
        style
    }

    /// Repairs values the overlay cannot run with. Returns whether anything
    /// was changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = default_poll_interval_ms();
            changed = true;
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            self.opacity = if self.opacity.is_nan() {
                default_opacity()
            } else {
                self.opacity.clamp(0.0, 1.0)
            };
            changed = true;
        }
        if self.fill_color.trim().is_empty() {
            self.fill_color = default_fill_color();
            changed = true;
        }
        changed
    }
}
