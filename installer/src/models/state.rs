// Session state (one per install session)
//
// NOTE: This value is never held ambiently. The engine loads it from a `SessionStore`,
// mutates it within a single render/submit call, and writes it back.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::feedback::Feedback;
use super::field::FieldValues;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_step: usize,
    #[serde(default)]
    pub allowed_next_step: Option<usize>,
    #[serde(default)]
    pub navigation_allowed: bool,
    /// Step id -> field key -> value. Only cleared by reset/expiry.
    #[serde(default)]
    pub saved_values: BTreeMap<String, FieldValues>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(default)]
    pub pending_feedback: Option<Feedback>,
    #[serde(default)]
    pub anti_forgery_token: Option<String>,
}

impl SessionState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_step: 1,
            allowed_next_step: None,
            navigation_allowed: false,
            saved_values: BTreeMap::new(),
            last_activity_at: now,
            pending_feedback: None,
            anti_forgery_token: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity_at > timeout
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Authorize exactly one transition to `step` on the next render.
    pub fn allow_navigation_to(&mut self, step: usize) {
        self.navigation_allowed = true;
        self.allowed_next_step = Some(step);
    }

    pub fn reset_navigation(&mut self) {
        self.navigation_allowed = false;
        self.allowed_next_step = None;
    }

    pub fn saved_for(&self, step_id: &str) -> Option<&FieldValues> {
        self.saved_values.get(step_id)
    }

    pub fn replace_values(&mut self, step_id: &str, values: FieldValues) {
        self.saved_values.insert(step_id.to_string(), values);
    }

    pub fn merge_values(&mut self, step_id: &str, values: FieldValues) {
        self.saved_values
            .entry(step_id.to_string())
            .or_default()
            .extend(values);
    }
}
