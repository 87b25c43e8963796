use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AstroViewError, Result};

/// How Horizons should interpret a target identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// Let Horizons search major and small bodies
    #[default]
    Auto,
    SmallBody,
    MajorBody,
    Designation,
    Name,
    AsteroidName,
    CometName,
}

impl IdType {
    pub const ALL: [IdType; 7] = [
        IdType::Auto,
        IdType::SmallBody,
        IdType::MajorBody,
        IdType::Designation,
        IdType::Name,
        IdType::AsteroidName,
        IdType::CometName,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IdType::Auto => "auto",
            IdType::SmallBody => "smallbody",
            IdType::MajorBody => "majorbody",
            IdType::Designation => "designation",
            IdType::Name => "name",
            IdType::AsteroidName => "asteroid_name",
            IdType::CometName => "comet_name",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdType {
    type Err = AstroViewError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        IdType::ALL
            .into_iter()
            .find(|id_type| id_type.as_str() == wanted)
            .ok_or_else(|| {
                AstroViewError::validation(format!(
                    "unknown id type '{s}', expected one of: {}",
                    IdType::ALL.map(IdType::as_str).join(", ")
                ))
            })
    }
}

/// A solar-system object as requested by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub id_type: IdType,
}

impl Target {
    pub fn new(id: impl Into<String>, id_type: IdType) -> Result<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(AstroViewError::validation("target id cannot be empty"));
        }
        Ok(Self { id, id_type })
    }

    pub fn small_body(id: impl Into<String>) -> Result<Self> {
        Self::new(id, IdType::SmallBody)
    }

    pub fn major_body(id: impl Into<String>) -> Result<Self> {
        Self::new(id, IdType::MajorBody)
    }

    /// The Horizons `COMMAND` value
    #[must_use]
    pub fn command(&self) -> String {
        match self.id_type {
            IdType::Auto | IdType::MajorBody => self.id.clone(),
            IdType::SmallBody => format!("{};", self.id),
            IdType::Designation => format!("DES={};", self.id),
            IdType::Name => format!("NAME={};", self.id),
            IdType::AsteroidName => format!("ASTNAM={};", self.id),
            IdType::CometName => format!("COMNAM={};", self.id),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
