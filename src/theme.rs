use ratatui::style::{Color, Modifier, Style};

// One Dark palette
pub const ACCENT_BLUE: Color = Color::Rgb(97, 175, 239);
pub const ACCENT_CYAN: Color = Color::Rgb(86, 182, 194);
pub const ACCENT_ORANGE: Color = Color::Rgb(209, 154, 102);
pub const BG_PRIMARY: Color = Color::Rgb(40, 44, 52);
pub const BG_SECONDARY: Color = Color::Rgb(33, 37, 43);
pub const BG_SELECTION: Color = Color::Rgb(62, 68, 81);
pub const BG_TERTIARY: Color = Color::Rgb(44, 49, 58);
pub const BORDER_FOCUSED: Color = Color::Rgb(97, 175, 239);
pub const BORDER_NORMAL: Color = Color::Rgb(92, 99, 112);
pub const ERROR: Color = Color::Rgb(224, 108, 117);
pub const FG_PRIMARY: Color = Color::Rgb(171, 178, 191);
pub const FG_SECONDARY: Color = Color::Rgb(92, 99, 112);
pub const SUCCESS: Color = Color::Rgb(152, 195, 121);
pub const WARNING: Color = Color::Rgb(229, 192, 123);

pub const fn bg_primary() -> Style {
  Style::new().bg(BG_PRIMARY).fg(FG_PRIMARY)
}

pub const fn input() -> Style {
  Style::new().bg(BG_TERTIARY).fg(FG_PRIMARY)
}

pub const fn border(focused: bool) -> Style {
  if focused {
    Style::new().fg(BORDER_FOCUSED)
  } else {
    Style::new().fg(BORDER_NORMAL)
  }
}

pub const fn title() -> Style {
  Style::new().fg(ACCENT_BLUE).add_modifier(Modifier::BOLD)
}

pub const fn header() -> Style {
  Style::new().bg(BG_SELECTION).fg(ACCENT_CYAN).add_modifier(Modifier::BOLD)
}

pub const fn selection_active() -> Style {
  Style::new().bg(ACCENT_BLUE).fg(BG_PRIMARY).add_modifier(Modifier::BOLD)
}

pub const fn selection() -> Style {
  Style::new().bg(BG_SELECTION).fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Primary-key cells, which cannot be edited.
pub const fn read_only() -> Style {
  Style::new().fg(FG_SECONDARY).add_modifier(Modifier::ITALIC)
}

/// Rows edited since the last load.
pub const fn dirty() -> Style {
  Style::new().fg(ACCENT_ORANGE)
}

/// Result block of a direct run that returned rows.
pub const fn highlight() -> Style {
  Style::new().bg(BG_TERTIARY).fg(SUCCESS)
}

pub const fn success() -> Style {
  Style::new().fg(SUCCESS).add_modifier(Modifier::BOLD)
}

pub const fn warning() -> Style {
  Style::new().fg(WARNING).add_modifier(Modifier::BOLD)
}

pub const fn error() -> Style {
  Style::new().fg(ERROR).add_modifier(Modifier::BOLD)
}

pub const fn muted() -> Style {
  Style::new().fg(FG_SECONDARY)
}

pub const fn status_bar() -> Style {
  Style::new().bg(BG_SECONDARY).fg(FG_PRIMARY)
}
