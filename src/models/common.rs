use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Where the user opened the form from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Richmenu,
    Chat,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Richmenu => "richmenu",
            Source::Chat => "chat",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "richmenu" => Ok(Source::Richmenu),
            "chat" => Ok(Source::Chat),
            other => Err(format!("unknown request source '{}'", other)),
        }
    }
}

/// Values supplied by the host messaging app for the active session.
///
/// `user_id` is empty when the host could not provide a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    pub user_id: String,
    pub source: Source,
}
