use serde::{Deserialize, Serialize};

/// Which part of the screen owns the keyboard. Keybindings are looked up per mode.
// The config crate may hand keys back lowercased, hence the aliases.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
  #[default]
  #[serde(alias = "tables")]
  Tables,
  #[serde(alias = "grid")]
  Grid,
  #[serde(alias = "editcell")]
  EditCell,
  #[serde(alias = "query")]
  Query,
  #[serde(alias = "sql")]
  Sql,
  #[serde(alias = "insert")]
  Insert,
}

impl Mode {
  /// Modes in which printable keys are text, not commands.
  pub fn is_text_input(self) -> bool {
    matches!(self, Self::EditCell | Self::Query | Self::Sql | Self::Insert)
  }
}
