use std::fmt;
use std::str::FromStr;

use activity_core::errors::{Result, TimelineError};
use serde::{Deserialize, Serialize};

/// Sub-feed of an owner's combined timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Namespace {
    #[default]
    Default,
    User(i64),
    Project(i64),
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Default => f.write_str("default"),
            Namespace::User(id) => write!(f, "user:{id}"),
            Namespace::Project(id) => write!(f, "project:{id}"),
        }
    }
}

impl FromStr for Namespace {
    type Err = TimelineError;

    fn from_str(value: &str) -> Result<Self> {
        if value == "default" {
            return Ok(Namespace::Default);
        }
        let (scope, id) = value
            .split_once(':')
            .ok_or_else(|| TimelineError::invalid(format!("malformed namespace: {value:?}")))?;
        let id: i64 = id
            .parse()
            .map_err(|_| TimelineError::invalid(format!("malformed namespace id: {value:?}")))?;
        match scope {
            "user" => Ok(Namespace::User(id)),
            "project" => Ok(Namespace::Project(id)),
            _ => Err(TimelineError::invalid(format!(
                "unknown namespace scope: {value:?}"
            ))),
        }
    }
}

impl TryFrom<String> for Namespace {
    type Error = TimelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.to_string()
    }
}
