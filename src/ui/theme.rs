//! Theme Colors for Ratatui
//! Usage:
//!   use ratatui::style::Color;
//!   let theme = Theme::dark();
//!   let primary_color = theme.primary;

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub primary_background: Color,
    pub secondary_background: Color,
    pub accent: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
    pub foreground: Color,
    pub background: Color,
    pub surface: Color,
    pub panel: Color,
    pub boost: Color,
}

impl Theme {
    pub const fn dark() -> Self {
        Self {
            primary: Color::from_u32(0x5fd7a7),
            secondary: Color::from_u32(0x2e8b6e),
            primary_background: Color::from_u32(0x1f4d3d),
            secondary_background: Color::from_u32(0x12332a),
            accent: Color::from_u32(0xffb454),
            warning: Color::from_u32(0xd7af5f),
            error: Color::from_u32(0xf07178),
            success: Color::from_u32(0x9fd96c),
            foreground: Color::from_u32(0xe6e1cf),
            background: Color::from_u32(0x0f1419),
            surface: Color::from_u32(0x1c232b),
            panel: Color::from_u32(0x252d38),
            boost: Color::from_u32(0x39434f),
        }
    }

    /// Gauge/label color graded by how loaded a metric is.
    pub fn usage_color(&self, percent: f32) -> Color {
        if percent >= 85.0 {
            self.error
        } else if percent >= 60.0 {
            self.warning
        } else {
            self.success
        }
    }

    /// Lighten a color by blending with white
    /// factor should be between 0.0 (no change) and 1.0 (white)
    pub fn lighten(color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => {
                let r = r as f32 + (255.0 - r as f32) * factor;
                let g = g as f32 + (255.0 - g as f32) * factor;
                let b = b as f32 + (255.0 - b as f32) * factor;
                Color::Rgb(r as u8, g as u8, b as u8)
            }
            _ => color,
        }
    }

    /// Darken a color by blending with black
    /// factor should be between 0.0 (no change) and 1.0 (black)
    pub fn darken(color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => {
                let r = r as f32 * (1.0 - factor);
                let g = g as f32 * (1.0 - factor);
                let b = b as f32 * (1.0 - factor);
                Color::Rgb(r as u8, g as u8, b as u8)
            }
            _ => color,
        }
    }
}
