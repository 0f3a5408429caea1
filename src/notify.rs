//! Upward change notifications.
//!
//! The engine never returns its state to the owner after a mutation; it pushes
//! it through these listeners instead. Any `FnMut` closure with the right
//! signature is a listener.

use crate::records::LineItem;

/// Receives the full record list after every committed change.
pub trait RecordsListener {
    fn records_changed(&mut self, records: &[LineItem]);
}

impl<F> RecordsListener for F
where
    F: FnMut(&[LineItem]),
{
    fn records_changed(&mut self, records: &[LineItem]) {
        self(records)
    }
}

/// Receives the raw override value after every committed update.
pub trait OverrideListener {
    fn override_changed(&mut self, value: &str);
}

impl<F> OverrideListener for F
where
    F: FnMut(&str),
{
    fn override_changed(&mut self, value: &str) {
        self(value)
    }
}
