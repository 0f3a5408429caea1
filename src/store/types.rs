use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::LineItem;

pub const CURRENT_VERSION: u32 = 1;

/// The records a host keeps for one category of one employee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppraisalFile {
    pub version: u32,
    /// Category id the rows were scored under
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppraisalFile {
    /// Create an empty file for a category
    pub fn new(category: &str, employee_id: Option<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            category: category.to_string(),
            employee_id,
            items: Vec::new(),
            override_score: None,
            updated_at: None,
        }
    }

    /// Stamp the file as modified now
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
