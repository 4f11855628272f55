use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One diary note, keyed to a single calendar day. `id`, `date` and
/// `created_at` are fixed at creation; only `text` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: String,
    pub date: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl DiaryEntry {
    pub fn new(date: impl Into<String>, text: impl Into<String>) -> Self {
        DiaryEntry {
            id: Uuid::new_v4().to_string(),
            date: date.into(),
            text: text.into(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}
