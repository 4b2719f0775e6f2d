//! Color themes.
//!
//! Two built-ins:
//!
//! - `dark`: ANSI 16 colors only, safe on any terminal including SSH sessions
//!   without truecolor.
//! - `catppuccin_mocha`: Catppuccin Mocha palette in RGB; wants truecolor.

use ratatui::style::Color;

/// Every color crafter paints with.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Editors
    /// Background behind lines that differ from the base code.
    pub changed_line_bg: Color,
    pub line_number: Color,
    /// Background of the source editor's cursor line.
    pub cursor_line_bg: Color,
    /// Background of selected source lines.
    pub selection_bg: Color,
    /// Dim text for empty-panel hints.
    pub placeholder: Color,

    // Toasts
    pub toast_info: Color,
    pub toast_success: Color,
    pub toast_error: Color,
    pub toast_fg: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_edit: Color,
    /// Busy indicator while a request is in flight.
    pub status_busy: Color,

    pub background: Color,
}

impl Theme {
    /// The ANSI 16-color theme. Works everywhere.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            changed_line_bg: Color::Rgb(30, 60, 30),
            line_number: Color::DarkGray,
            cursor_line_bg: Color::Black,
            selection_bg: Color::Blue,
            placeholder: Color::DarkGray,

            toast_info: Color::DarkGray,
            toast_success: Color::Green,
            toast_error: Color::Red,
            toast_fg: Color::White,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_edit: Color::Green,
            status_busy: Color::Yellow,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha in truecolor.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68);    // #313244
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let crust = Color::Rgb(17, 17, 27);       // #11111b
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let diff_bg = Color::Rgb(40, 58, 48);

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            changed_line_bg: diff_bg,
            line_number: overlay1,
            cursor_line_bg: surface0,
            selection_bg: surface1,
            placeholder: overlay1,

            toast_info: surface1,
            toast_success: green,
            toast_error: red,
            toast_fg: crust,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_edit: green,
            status_busy: yellow,

            background: base,
        }
    }

    /// Resolves a config theme name. Unknown names fall back to `dark()`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
