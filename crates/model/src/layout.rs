//! Slate and burn-in layout constants.

use serde::{Deserialize, Serialize};

/// Output canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };
}

/// Positions, sizes, and colors used when laying out text and assets.
///
/// Margins are filter expressions evaluated by the media engine, so they
/// may reference the frame size (`w`, `h`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Right edge of labels / left edge of values.
    pub left_text_margin: String,
    /// Y of the first label/value row.
    pub top_text_margin: String,
    /// Body text size.
    pub font_size: u32,
    /// Vertical distance between rows.
    pub line_spacing: u32,
    /// Text color name or hex value.
    pub font_color: String,
    /// Slate and movie canvas.
    pub canvas: Resolution,
    /// Company headline size.
    pub company_font_size: u32,
    /// Project headline size.
    pub project_font_size: u32,
    /// Burn-in text size.
    pub burnin_font_size: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left_text_margin: "(w)/2+150".to_string(),
            top_text_margin: "380".to_string(),
            font_size: 40,
            line_spacing: 40,
            font_color: "White".to_string(),
            canvas: Resolution::HD,
            company_font_size: 80,
            project_font_size: 50,
            burnin_font_size: 30,
        }
    }
}

impl LayoutConfig {
    /// Y expression of a label/value row.
    pub fn row_y(&self, row: usize) -> String {
        format!("{}+{}*{}", self.top_text_margin, self.line_spacing, row)
    }

    /// X expression of a right-aligned row label.
    pub fn label_x(&self) -> String {
        format!("{}-text_w", self.left_text_margin)
    }

    /// X expression of a row value.
    pub fn value_x(&self) -> String {
        format!("{}+10", self.left_text_margin)
    }
}
