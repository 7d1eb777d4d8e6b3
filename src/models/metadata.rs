//! The catalog record produced for one thread page.

use serde::{Deserialize, Serialize};

use super::TagSet;

/// Name used when no title strategy yields anything.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Release status of a catalog item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Ongoing,
    Completed,
    Abandoned,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ongoing => "Ongoing",
            Status::Completed => "Completed",
            Status::Abandoned => "Abandoned",
        }
    }

    /// Match a single lower-cased title word against the status vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ongoing" => Some(Status::Ongoing),
            "completed" | "complete" => Some(Status::Completed),
            "abandoned" => Some(Status::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(&s.trim().to_lowercase()).ok_or_else(|| {
            format!(
                "Invalid status '{}'. Valid options: ongoing, completed, abandoned",
                s
            )
        })
    }
}

/// Game engine a catalog item is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "RenPy")]
    RenPy,
    #[serde(rename = "RPGM")]
    Rpgm,
    Unity,
    Unreal,
    Flash,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "QSP")]
    Qsp,
    #[default]
    Other,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::RenPy => "RenPy",
            Engine::Rpgm => "RPGM",
            Engine::Unity => "Unity",
            Engine::Unreal => "Unreal",
            Engine::Flash => "Flash",
            Engine::Html => "HTML",
            Engine::Qsp => "QSP",
            Engine::Other => "Other",
        }
    }

    /// Match a single lower-cased title word against the engine vocabulary.
    ///
    /// `Other` is the default and never matched from a title word.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ren'py" | "renpy" => Some(Engine::RenPy),
            "rpgm" | "rpgmaker" => Some(Engine::Rpgm),
            "unity" => Some(Engine::Unity),
            "unreal" | "ue4" | "ue5" => Some(Engine::Unreal),
            "flash" => Some(Engine::Flash),
            "html" => Some(Engine::Html),
            "qsp" => Some(Engine::Qsp),
            _ => None,
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "other" | "others" => Ok(Engine::Other),
            token => Self::from_token(token).ok_or_else(|| {
                format!(
                    "Invalid engine '{}'. Valid options: renpy, rpgm, unity, unreal, flash, html, qsp, other",
                    s
                )
            }),
        }
    }
}

/// Metadata extracted from one thread page.
///
/// Built once by the parser and handed to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameMetadata {
    pub name: String,
    pub version: Option<String>,
    pub developer: Option<String>,
    pub status: Status,
    pub engine: Engine,
    pub tags: TagSet,
    pub image: Option<String>,
    pub source_url: String,
}
