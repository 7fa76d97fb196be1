//! The task record and the inputs accepted by create and update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::TaskId;

/// A stored task.
///
/// `id` and `created_at` never change after creation. `updated_at` starts equal
/// to `created_at` and only advances when `text` or `is_complete` actually
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub text: String,
    pub is_complete: bool,
}

impl Task {
    /// A fresh, incomplete task with a new id, stamped at `now`.
    pub fn new(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            created_at: now,
            updated_at: now,
            text: text.into(),
            is_complete: false,
        }
    }

    /// Merge `patch` into this task. Returns whether anything changed.
    ///
    /// An empty `patch.text` leaves the text alone; `is_complete` is always
    /// taken from the patch. `updated_at` is bumped only on change, and never
    /// moves backwards.
    pub fn apply(&mut self, patch: &TaskPatch, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if let Some(text) = patch.text_change() {
            if text != self.text {
                text.clone_into(&mut self.text);
                changed = true;
            }
        }

        if patch.is_complete != self.is_complete {
            self.is_complete = patch.is_complete;
            changed = true;
        }

        if changed {
            self.updated_at = now.max(self.updated_at);
        }
        changed
    }
}

/// Input for creating a task. Everything else is assigned by the repository.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Input for updating a task.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// Replacement text; empty means "keep the current text".
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_complete: bool,
}

impl TaskPatch {
    pub fn new(text: impl Into<String>, is_complete: bool) -> Self {
        Self {
            text: text.into(),
            is_complete,
        }
    }

    /// The requested text, or `None` when the patch leaves text unchanged.
    pub fn text_change(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }
}

/// Absent and `null` fields both decode to the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
