//! Form mode.
//!
//! Only the identity of the mode matters to the field: create mode seeds
//! from the starter value, view mode is terminal and locks the field.

use serde::{Deserialize, Serialize};

/// The surrounding form's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ModeRepr")]
pub enum FormMode {
    /// New item. Selection seeds from the field's starter value.
    Create,
    /// Existing item. Selection seeds from the record snapshot.
    Edit,
    /// Display / completed item. Terminal: the field locks.
    View,
}

impl FormMode {
    /// Whether this mode locks every field it renders.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::View)
    }

    /// Numeric control-mode identity used by list-form hosts.
    pub fn code(self) -> u8 {
        match self {
            Self::Create => 8,
            Self::Edit => 6,
            Self::View => 4,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            8 => Some(Self::Create),
            6 => Some(Self::Edit),
            4 => Some(Self::View),
            _ => None,
        }
    }
}

impl Default for FormMode {
    fn default() -> Self {
        Self::Edit
    }
}

impl std::fmt::Display for FormMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Edit => write!(f, "edit"),
            Self::View => write!(f, "view"),
        }
    }
}

impl std::str::FromStr for FormMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "new" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "view" | "display" => Ok(Self::View),
            other => other
                .parse::<u64>()
                .ok()
                .and_then(Self::from_code)
                .ok_or_else(|| format!("unknown form mode: {s}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Code(u64),
    Name(String),
}

impl TryFrom<ModeRepr> for FormMode {
    type Error = String;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown form mode code: {code}"))
            }
            ModeRepr::Name(name) => name.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse() {
        assert_eq!("create".parse::<FormMode>().unwrap(), FormMode::Create);
        assert_eq!("New".parse::<FormMode>().unwrap(), FormMode::Create);
        assert_eq!("display".parse::<FormMode>().unwrap(), FormMode::View);
        assert_eq!("6".parse::<FormMode>().unwrap(), FormMode::Edit);
        assert!("archive".parse::<FormMode>().is_err());
    }

    #[test]
    fn mode_deserializes_from_names_and_codes() {
        let named: FormMode = serde_json::from_str("\"view\"").unwrap();
        let coded: FormMode = serde_json::from_str("8").unwrap();
        assert_eq!(named, FormMode::View);
        assert_eq!(coded, FormMode::Create);
        assert!(serde_json::from_str::<FormMode>("3").is_err());
    }

    #[test]
    fn only_view_is_terminal() {
        assert!(FormMode::View.is_terminal());
        assert!(!FormMode::Edit.is_terminal());
        assert!(!FormMode::Create.is_terminal());
    }
}
