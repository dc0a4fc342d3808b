//! Human-readable diagnostic messages.
//!
//! Every message the library logs comes from a [`Diagnostics`] value handed to
//! the component that logs it. Nothing reads a global table, so applications
//! can reword or translate messages and tests can assert on exact text.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Read-only table of diagnostic messages, one per situation.
///
/// Deserializes with every field optional; missing fields keep the default
/// wording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    /// `trigger` found no handlers for the event.
    pub handler_not_found: String,
    /// A fetch completed with a non-success status.
    pub fetch_failed: String,
    /// A save completed with a non-success status.
    pub save_failed: String,
    /// A single-record fetch was attempted without an identifier.
    pub id_not_found: String,
    /// An event-map selector matched nothing in the rendered markup.
    pub element_not_found: String,
    /// The mount point for a view could not be located.
    pub root_element_not_found: String,
    /// An event-map or region selector could not be parsed.
    pub invalid_selector: String,
    /// A view failed to redraw after its model changed.
    pub render_failed: String,
    /// An update could not be merged into the record and was dropped.
    pub merge_failed: String,
    /// `set` was called while the record was still borrowed and was dropped.
    pub model_busy: String,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            handler_not_found: "There are no event handlers registered for this event".to_string(),
            fetch_failed: "Data could not be fetched!".to_string(),
            save_failed: "Data could not be saved!".to_string(),
            id_not_found: "Id could not be found!".to_string(),
            element_not_found: "The specified DOM element could not be found!".to_string(),
            root_element_not_found: "The specified root element could not be found!".to_string(),
            invalid_selector: "The specified selector is not valid!".to_string(),
            render_failed: "The view could not be rendered!".to_string(),
            merge_failed: "Data could not be merged!".to_string(),
            model_busy: "Data is still being read and could not be updated!".to_string(),
        }
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the table for sharing between components.
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }
}
