//! Actor roles and the capability table every mutation consults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Session role of the actor driving a scored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Owner of the records: edits fields and manages rows.
    #[default]
    #[serde(alias = "faculty")]
    Editor,
    /// Sees everything, changes nothing.
    #[serde(rename = "read-only-viewer", alias = "viewer", alias = "hod")]
    ReadOnlyViewer,
    /// Reviewer who records an independent total.
    #[serde(alias = "committee")]
    OverrideScorer,
}

/// What a role is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub edit_fields: bool,
    pub manage_rows: bool,
    pub set_override: bool,
}

impl Capabilities {
    const NONE: Capabilities = Capabilities {
        edit_fields: false,
        manage_rows: false,
        set_override: false,
    };
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Editor, Role::ReadOnlyViewer, Role::OverrideScorer];

    /// The single role-to-capability table.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Role::Editor => Capabilities {
                edit_fields: true,
                manage_rows: true,
                set_override: false,
            },
            Role::ReadOnlyViewer => Capabilities::NONE,
            Role::OverrideScorer => Capabilities {
                set_override: true,
                ..Capabilities::NONE
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::ReadOnlyViewer => "read-only-viewer",
            Role::OverrideScorer => "override-scorer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "editor" | "faculty" => Ok(Role::Editor),
            "read-only-viewer" | "viewer" | "hod" => Ok(Role::ReadOnlyViewer),
            "override-scorer" | "committee" => Ok(Role::OverrideScorer),
            other => Err(format!(
                "unknown role '{}' (expected editor, read-only-viewer or override-scorer)",
                other
            )),
        }
    }
}
