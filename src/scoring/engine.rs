use tracing::{debug, info, warn};

use super::config::CategoryConfig;
use crate::access::{Capabilities, Role};
use crate::notify::RecordsListener;
use crate::records::{FieldEdit, LineItem};

/// Result of a list operation that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed.
    Applied,
    /// The session role may not perform this operation; nothing changed.
    NotPermitted,
    /// Nothing to do: an empty resync, or an add on a list already at the cap.
    Unchanged,
    /// The cap would be exceeded; state kept and a warning set.
    Rejected,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// Caller mistakes that leave the list untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("row {} does not exist (list has {len} rows)", .index + 1)]
    RowOutOfRange { index: usize, len: usize },

    #[error("unknown field '{key}' for category '{category}'")]
    UnknownField { key: String, category: String },

    #[error("'{value}' is not an author role in category '{category}'")]
    UnknownRole { value: String, category: String },
}

/// A capped list of scored line items for one category.
///
/// The list is the only mutator of its items. Every committed edit or delete is
/// pushed to the records listener after the commit; a bare append is only
/// pushed when the category sets `notify_on_add`.
pub struct ScoredList {
    category: CategoryConfig,
    role: Role,
    items: Vec<LineItem>,
    warning: Option<String>,
    listener: Option<Box<dyn RecordsListener>>,
}

impl ScoredList {
    pub fn new(category: CategoryConfig, role: Role) -> Self {
        Self {
            category,
            role,
            items: Vec::new(),
            warning: None,
            listener: None,
        }
    }

    /// Record who is driving this session. Diagnostics only.
    pub fn with_actor(self, actor: Option<&str>) -> Self {
        if let Some(actor) = actor {
            info!(
                category = %self.category.id,
                role = %self.role,
                actor,
                "opened scored list"
            );
        }
        self
    }

    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: RecordsListener + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn category(&self) -> &CategoryConfig {
        &self.category
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The pending soft-validation message, if any.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Sum of all row scores, saturating at `u32::MAX`.
    pub fn aggregate_score(&self) -> u32 {
        u32::try_from(self.total()).unwrap_or(u32::MAX)
    }

    /// Whether the add-row control should be enabled.
    pub fn can_add_row(&self) -> bool {
        self.capabilities().manage_rows && self.total() < u64::from(self.category.max_score)
    }

    // Resynced records are not bounded, so cap checks sum in u64.
    fn total(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.score)).sum()
    }

    /// Replace the list with externally supplied records.
    ///
    /// Empty input means "no update available" and keeps the current list.
    pub fn apply_external_update(&mut self, records: Vec<LineItem>) -> Outcome {
        if records.is_empty() {
            return Outcome::Unchanged;
        }
        self.items = records;
        let total = self.total();
        if total > u64::from(self.category.max_score) {
            warn!(
                category = %self.category.id,
                total,
                cap = self.category.max_score,
                "external records already exceed the cap"
            );
        }
        debug!(category = %self.category.id, rows = self.items.len(), total, "resynced records");
        Outcome::Applied
    }

    /// Apply one field edit to the row at `index` (0-based).
    pub fn edit_field(&mut self, index: usize, edit: FieldEdit) -> Result<Outcome, ListError> {
        if !self.capabilities().edit_fields {
            return Ok(Outcome::NotPermitted);
        }
        self.check_index(index)?;

        match edit {
            FieldEdit::Role(value) => {
                let candidate =
                    self.category
                        .score_for(&value)
                        .ok_or_else(|| ListError::UnknownRole {
                            value: value.clone(),
                            category: self.category.id.clone(),
                        })?;
                let hypothetical =
                    self.total() - u64::from(self.items[index].score) + u64::from(candidate);
                if hypothetical > u64::from(self.category.max_score) {
                    warn!(
                        category = %self.category.id,
                        row = index + 1,
                        hypothetical,
                        "role change rejected by cap"
                    );
                    self.warning = Some(format!(
                        "Total score cannot exceed {}.",
                        self.category.max_score
                    ));
                    return Ok(Outcome::Rejected);
                }
                let item = &mut self.items[index];
                item.role = value;
                item.score = candidate;
                self.warning = None;
                debug!(category = %self.category.id, row = index + 1, score = candidate, "role updated");
            }
            FieldEdit::Text { key, value } => {
                if !self.category.has_field(&key) {
                    return Err(ListError::UnknownField {
                        key,
                        category: self.category.id.clone(),
                    });
                }
                debug!(category = %self.category.id, row = index + 1, field = %key, "field updated");
                self.items[index].fields.insert(key, value);
            }
            FieldEdit::CoAuthors(count) => {
                self.items[index].co_authors = count;
                debug!(category = %self.category.id, row = index + 1, count, "co-authors updated");
            }
        }

        self.notify();
        Ok(Outcome::Applied)
    }

    /// Append a blank row.
    ///
    /// The pre-check assumes the new row will eventually reach `per_row_max`,
    /// so it can refuse an add that would not exceed the cap at score 0.
    pub fn add_row(&mut self) -> Outcome {
        if !self.can_add_row() {
            return if self.capabilities().manage_rows {
                Outcome::Unchanged
            } else {
                Outcome::NotPermitted
            };
        }

        let total = self.total();
        if total + u64::from(self.category.per_row_max) > u64::from(self.category.max_score) {
            warn!(category = %self.category.id, total, "add row rejected by cap");
            self.warning = Some(format!(
                "Cannot add row. Maximum total score of {} will be exceeded.",
                self.category.max_score
            ));
            return Outcome::Rejected;
        }

        self.items.push(LineItem::blank(&self.category));
        self.warning = None;
        debug!(category = %self.category.id, rows = self.items.len(), "row added");
        if self.category.notify_on_add {
            self.notify();
        }
        Outcome::Applied
    }

    /// Remove the row at `index` (0-based); later rows move up.
    pub fn delete_row(&mut self, index: usize) -> Result<Outcome, ListError> {
        if !self.capabilities().manage_rows {
            return Ok(Outcome::NotPermitted);
        }
        self.check_index(index)?;

        let removed = self.items.remove(index);
        debug!(
            category = %self.category.id,
            row = index + 1,
            score = removed.score,
            "row deleted"
        );
        self.notify();
        Ok(Outcome::Applied)
    }

    fn check_index(&self, index: usize) -> Result<(), ListError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ListError::RowOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.records_changed(&self.items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<Vec<LineItem>>>>;

    fn recording_list(category: CategoryConfig, role: Role) -> (ScoredList, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let list = ScoredList::new(category, role)
            .with_listener(move |records: &[LineItem]| sink.borrow_mut().push(records.to_vec()));
        (list, log)
    }

    fn row(title: &str, role: &str, score: u32) -> LineItem {
        let mut item = LineItem::blank(&CategoryConfig::book_chapter());
        item.fields.insert("title".to_string(), title.to_string());
        item.role = role.to_string();
        item.score = score;
        item
    }

    /// Book-chapter rows adding up to `scores`.
    fn rows(scores: &[u32]) -> Vec<LineItem> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                let role = match score {
                    20 => "First Author",
                    15 => "Co-author",
                    _ => "",
                };
                row(&format!("Chapter {}", i + 1), role, score)
            })
            .collect()
    }

    fn set_role(value: &str) -> FieldEdit {
        FieldEdit::Role(value.to_string())
    }

    #[test]
    fn test_role_derives_score() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[0, 0, 0]));

        assert_eq!(list.edit_field(0, set_role("First Author")), Ok(Outcome::Applied));
        assert_eq!(list.edit_field(1, set_role("Co-author")), Ok(Outcome::Applied));
        assert_eq!(list.edit_field(2, set_role("")), Ok(Outcome::Applied));

        let scores: Vec<_> = list.items().iter().map(|i| i.score).collect();
        assert_eq!(scores, [20, 15, 0]);
        assert_eq!(list.aggregate_score(), 35);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_conference_co_author_scores_ten() {
        let (mut list, _log) = recording_list(CategoryConfig::conference_paper(), Role::Editor);
        list.add_row();
        list.edit_field(0, set_role("Co-author")).unwrap();
        assert_eq!(list.items()[0].score, 10);
        list.edit_field(0, set_role("Main Author")).unwrap();
        assert_eq!(list.items()[0].score, 20);
    }

    #[test]
    fn test_role_edit_rejected_over_cap() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 15, 15, 15, 0]));
        assert_eq!(list.aggregate_score(), 85);

        let outcome = list.edit_field(5, set_role("First Author")).unwrap();

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(list.items()[5].score, 0);
        assert!(list.items()[5].role.is_empty());
        assert_eq!(list.aggregate_score(), 85);
        assert_eq!(list.warning(), Some("Total score cannot exceed 100."));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_role_edit_reaches_cap_exactly() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 20, 20, 0]));

        let outcome = list.edit_field(4, set_role("First Author")).unwrap();

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(list.aggregate_score(), 100);
        assert_eq!(list.warning(), None);
        assert_eq!(log.borrow().last().unwrap()[4].score, 20);
    }

    #[test]
    fn test_role_swap_counts_old_score_out() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 20, 20, 15]));
        // 95 - 15 + 20 = 100
        assert_eq!(list.edit_field(4, set_role("First Author")), Ok(Outcome::Applied));
        assert_eq!(list.aggregate_score(), 100);
    }

    #[test]
    fn test_successful_role_edit_clears_warning() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 20, 20, 20, 0]));
        assert_eq!(list.edit_field(5, set_role("Co-author")), Ok(Outcome::Rejected));
        assert!(list.warning().is_some());

        // 100 - 20 + 15 = 95
        assert_eq!(list.edit_field(4, set_role("Co-author")), Ok(Outcome::Applied));
        assert_eq!(list.warning(), None);
        assert_eq!(list.aggregate_score(), 95);
    }

    #[test]
    fn test_text_edit_skips_cap_and_keeps_warning() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 20, 20, 20, 0]));
        list.edit_field(5, set_role("Co-author")).unwrap();
        assert!(list.warning().is_some());

        let edit = FieldEdit::Text {
            key: "publisher_details".to_string(),
            value: "Springer".to_string(),
        };
        assert_eq!(list.edit_field(5, edit), Ok(Outcome::Applied));
        assert_eq!(list.edit_field(5, FieldEdit::CoAuthors(4)), Ok(Outcome::Applied));

        assert_eq!(list.items()[5].field("publisher_details"), "Springer");
        assert_eq!(list.items()[5].co_authors, 4);
        assert_eq!(list.items()[5].score, 0);
        assert!(list.warning().is_some());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_unknown_field_and_role_are_errors() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.add_row();

        let err = list
            .edit_field(
                0,
                FieldEdit::Text {
                    key: "conference_details".to_string(),
                    value: "x".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ListError::UnknownField { .. }));

        let err = list.edit_field(0, set_role("Main Author")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Main Author' is not an author role in category 'book-chapter'"
        );
        assert_eq!(list.items()[0], LineItem::blank(list.category()));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_row_out_of_range() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20]));
        assert_eq!(
            list.edit_field(1, FieldEdit::CoAuthors(1)),
            Err(ListError::RowOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            list.delete_row(3).unwrap_err().to_string(),
            "row 4 does not exist (list has 1 rows)"
        );
    }

    #[test]
    fn test_add_row_appends_blank_without_notifying() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 20, 19]));
        assert_eq!(list.aggregate_score(), 79);

        assert_eq!(list.add_row(), Outcome::Applied);
        assert_eq!(list.items().len(), 5);
        assert_eq!(list.items()[4], LineItem::blank(list.category()));
        assert_eq!(list.aggregate_score(), 79);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_add_row_notifies_when_enabled() {
        let mut category = CategoryConfig::conference_paper();
        category.notify_on_add = true;
        let (mut list, log) = recording_list(category, Role::Editor);

        assert_eq!(list.add_row(), Outcome::Applied);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].len(), 1);
    }

    #[test]
    fn test_add_row_conservative_guard() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 15, 15, 15]));

        assert_eq!(list.add_row(), Outcome::Rejected);
        assert_eq!(list.items().len(), 5);
        assert_eq!(
            list.warning(),
            Some("Cannot add row. Maximum total score of 100 will be exceeded.")
        );
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_add_row_at_cap_is_silent() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 20, 20, 20]));

        assert!(!list.can_add_row());
        assert_eq!(list.add_row(), Outcome::Unchanged);
        assert_eq!(list.items().len(), 5);
        assert_eq!(list.warning(), None);
    }

    #[test]
    fn test_warning_survives_resync_until_next_success() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 20, 15, 15, 15]));
        assert_eq!(list.add_row(), Outcome::Rejected);

        list.apply_external_update(rows(&[20]));
        assert!(list.warning().is_some());

        assert_eq!(list.add_row(), Outcome::Applied);
        assert_eq!(list.warning(), None);
    }

    #[test]
    fn test_add_row_with_huge_per_row_max_is_rejected() {
        let mut category = CategoryConfig::book_chapter();
        category.per_row_max = u32::MAX;
        let (mut list, _log) = recording_list(category, Role::Editor);
        list.apply_external_update(vec![row("Chapter 1", "", 1)]);

        assert_eq!(list.add_row(), Outcome::Rejected);
        assert_eq!(list.items().len(), 1);
        assert!(list.warning().is_some());
    }

    #[test]
    fn test_delete_row_shifts_later_rows() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        let original = rows(&[20, 15, 0, 15]);
        list.apply_external_update(original.clone());

        assert_eq!(list.delete_row(1), Ok(Outcome::Applied));

        assert_eq!(list.items(), &[original[0].clone(), original[2].clone(), original[3].clone()]);
        assert_eq!(list.items()[1].field("title"), "Chapter 3");
        assert_eq!(list.items()[2].field("title"), "Chapter 4");
        assert_eq!(list.aggregate_score(), 35);
        assert_eq!(log.borrow().last().unwrap().len(), 3);
    }

    #[test]
    fn test_resync_replaces_wholesale() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 15]));
        let replacement = rows(&[15]);

        assert_eq!(list.apply_external_update(replacement.clone()), Outcome::Applied);
        assert_eq!(list.items(), replacement.as_slice());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_resync_ignores_empty_data() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(rows(&[20, 15]));

        assert_eq!(list.apply_external_update(Vec::new()), Outcome::Unchanged);
        assert_eq!(list.items().len(), 2);
        assert_eq!(list.aggregate_score(), 35);
    }

    #[test]
    fn test_resync_with_huge_scores_does_not_panic() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        list.apply_external_update(vec![
            row("Chapter 1", "First Author", u32::MAX),
            row("Chapter 2", "Co-author", 1),
        ]);
        assert_eq!(list.aggregate_score(), u32::MAX);
        assert!(!list.can_add_row());

        assert_eq!(list.edit_field(1, FieldEdit::CoAuthors(2)), Ok(Outcome::Applied));
        assert_eq!(list.edit_field(1, set_role("")), Ok(Outcome::Rejected));
        // Swapping the huge row out still counts the other one
        assert_eq!(list.edit_field(0, set_role("Co-author")), Ok(Outcome::Applied));
        assert_eq!(list.aggregate_score(), 16);
        assert_eq!(list.add_row(), Outcome::Applied);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_resync_is_idempotent() {
        let (mut list, _log) = recording_list(CategoryConfig::book_chapter(), Role::Editor);
        let data = rows(&[20, 15, 0]);
        list.apply_external_update(data.clone());
        let first = list.items().to_vec();
        list.apply_external_update(data);
        assert_eq!(list.items(), first.as_slice());
    }

    #[test]
    fn test_viewer_changes_nothing() {
        let (mut list, log) = recording_list(CategoryConfig::book_chapter(), Role::ReadOnlyViewer);
        let data = rows(&[20, 15, 0]);
        list.apply_external_update(data.clone());

        assert_eq!(list.edit_field(2, set_role("First Author")), Ok(Outcome::NotPermitted));
        assert_eq!(list.edit_field(0, FieldEdit::CoAuthors(9)), Ok(Outcome::NotPermitted));
        assert_eq!(list.add_row(), Outcome::NotPermitted);
        assert_eq!(list.delete_row(0), Ok(Outcome::NotPermitted));
        // Permission is checked before the index
        assert_eq!(list.delete_row(42), Ok(Outcome::NotPermitted));

        assert_eq!(list.items(), data.as_slice());
        assert_eq!(list.warning(), None);
        assert!(!list.can_add_row());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_override_scorer_cannot_edit_rows() {
        let (mut list, log) = recording_list(CategoryConfig::conference_paper(), Role::OverrideScorer);
        assert_eq!(list.add_row(), Outcome::NotPermitted);
        assert!(list.items().is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_notification_sees_committed_state() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let mut list = ScoredList::new(CategoryConfig::book_chapter(), Role::Editor)
            .with_actor(Some("EMP-042"))
            .with_listener(move |records: &[LineItem]| {
                *sink.borrow_mut() = Some(records.iter().map(|r| r.score).sum::<u32>());
            });
        list.add_row();
        list.edit_field(0, set_role("Co-author")).unwrap();
        assert_eq!(*seen.borrow(), Some(15));
    }
}
