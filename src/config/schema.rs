use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::scoring::CategoryConfig;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Scored categories; the built-in book-chapter and conference-paper
    /// tables when omitted
    #[serde(default = "CategoryConfig::builtin")]
    pub categories: Vec<CategoryConfig>,

    /// Role used when `--role` is not given
    #[serde(default)]
    pub default_role: Option<Role>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: CategoryConfig::builtin(),
            default_role: None,
        }
    }
}

impl Config {
    pub fn category(&self, id: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.id == id)
    }
}
