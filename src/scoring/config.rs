use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_SCORE: u32 = 100;
pub const DEFAULT_PER_ROW_MAX: u32 = 20;

/// Scoring template for one category of records.
///
/// Both built-in categories share the same engine and differ only in the
/// values carried here.
///
/// Example YAML:
/// ```yaml
/// id: book-chapter
/// title: "B. Published Full Papers in Book Chapters in SCOPUS/WOS only"
/// max_score: 100
/// per_row_max: 20
/// fields:
///   - { key: title, label: "Title of the Book Chapter" }
///   - { key: publisher_details, label: "Details of Publisher" }
/// roles:
///   - { value: "First Author", score: 20 }
///   - { value: "Co-author", score: 15 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// Identifier used on the command line and in appraisal files
    pub id: String,

    /// Heading shown above the table
    #[serde(default)]
    pub title: String,

    /// Ceiling for the aggregate score and the override score (default: 100)
    #[serde(default = "default_max_score")]
    pub max_score: u32,

    /// Highest score a single row can reach, used by the add-row pre-check (default: 20)
    #[serde(default = "default_per_row_max")]
    pub per_row_max: u32,

    /// Free-text columns in display order
    pub fields: Vec<FieldSpec>,

    /// Author role choices and the score each one derives
    pub roles: Vec<RoleScore>,

    /// Notify the records listener after a bare append (default: false)
    #[serde(default)]
    pub notify_on_add: bool,
}

fn default_max_score() -> u32 {
    DEFAULT_MAX_SCORE
}

fn default_per_row_max() -> u32 {
    DEFAULT_PER_ROW_MAX
}

/// A free-text column.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub key: String,
    #[serde(default)]
    pub label: String,
}

/// One entry of the role-to-score lookup.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoleScore {
    /// Stored role attribute value (e.g. "First Author")
    pub value: String,
    /// Display label, defaults to the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub score: u32,
}

/// Whether a role attribute value means "no role selected".
pub fn is_unset_role(value: &str) -> bool {
    value.trim().is_empty()
}

impl CategoryConfig {
    /// Book chapters: first author 20, co-author 15.
    pub fn book_chapter() -> Self {
        Self {
            id: "book-chapter".to_string(),
            title: "B. Published Full Papers in Book Chapters in SCOPUS/WOS only".to_string(),
            max_score: DEFAULT_MAX_SCORE,
            per_row_max: DEFAULT_PER_ROW_MAX,
            fields: vec![
                FieldSpec::new("title", "Title of the Book Chapter"),
                FieldSpec::new("publisher_details", "Details of Publisher"),
                FieldSpec::new("issn_isbn", "ISSN/ISBN No."),
            ],
            roles: vec![
                RoleScore::new("First Author", 20),
                RoleScore::new("Co-author", 15),
            ],
            notify_on_add: false,
        }
    }

    /// Conference papers: main author 20, co-author 10.
    pub fn conference_paper() -> Self {
        Self {
            id: "conference-paper".to_string(),
            title: "D. Published Full Papers / Presented in Conference Proceedings".to_string(),
            max_score: DEFAULT_MAX_SCORE,
            per_row_max: DEFAULT_PER_ROW_MAX,
            fields: vec![
                FieldSpec::new("title", "Title"),
                FieldSpec::new("conference_details", "Conference Details"),
                FieldSpec::new("issn_isbn", "ISSN/ISBN No."),
            ],
            roles: vec![
                RoleScore::new("Main Author", 20),
                RoleScore::new("Co-author", 10),
            ],
            notify_on_add: false,
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::book_chapter(), Self::conference_paper()]
    }

    /// Derive a row score from a role attribute value.
    ///
    /// Unset (blank) values score 0; values missing from the table return None.
    pub fn score_for(&self, role: &str) -> Option<u32> {
        if is_unset_role(role) {
            return Some(0);
        }
        self.roles
            .iter()
            .find(|r| r.value == role)
            .map(|r| r.score)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }
}

impl FieldSpec {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

impl RoleScore {
    pub fn new(value: &str, score: u32) -> Self {
        Self {
            value: value.to_string(),
            label: None,
            score,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}
