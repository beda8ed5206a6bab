use serde::{Deserialize, Serialize};

/// A single dated event extracted from the history of present illness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Relative time marker, e.g. `"Há 3 dias"` or `"Ontem"`.
    pub time: String,
    pub event: String,
}
