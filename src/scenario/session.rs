//! Per-scenario session state, passed explicitly through every step.

use crate::browser::{Dialog, Page};
use crate::locator::WaitSettings;
use crate::scenario::schema::Step;
use std::collections::HashMap;

pub struct Session<'p> {
    page: &'p dyn Page,
    pub variables: HashMap<String, String>,
    counts: HashMap<String, usize>,
    /// Index of the first dialog not yet consumed by `wait_for_dialog`
    dialog_cursor: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub wait: WaitSettings,
}

impl<'p> Session<'p> {
    pub fn new(page: &'p dyn Page, variables: HashMap<String, String>, wait: WaitSettings) -> Self {
        Self {
            page,
            variables,
            counts: HashMap::new(),
            dialog_cursor: 0,
            last_url: None,
            last_status: None,
            wait,
        }
    }

    pub fn page(&self) -> &'p dyn Page {
        self.page
    }

    pub fn remember_count(&mut self, key: &str, count: usize) {
        self.counts.insert(key.to_string(), count);
    }

    pub fn count(&self, key: &str) -> Option<usize> {
        self.counts.get(key).copied()
    }

    /// Dialogs opened since the last consumed one, with their absolute index.
    pub fn pending_dialogs(&self) -> Vec<(usize, Dialog)> {
        self.page
            .dialogs()
            .into_iter()
            .enumerate()
            .skip(self.dialog_cursor)
            .collect()
    }

    pub fn consume_dialog(&mut self, index: usize) {
        self.dialog_cursor = index + 1;
    }

    pub fn interpolate(&self, step: &Step) -> Step {
        interpolate_step(step, &self.variables)
    }
}

/// Replace `${name}` references in every string of a step.
pub fn interpolate_step(step: &Step, vars: &HashMap<String, String>) -> Step {
    let Ok(json_str) = serde_json::to_string(step) else {
        return step.clone();
    };

    let mut result = json_str;
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        // Escape for the JSON string the placeholder sits in
        let encoded = serde_json::to_string(value).unwrap_or_default();
        let replacement = encoded
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(value.as_str());
        result = result.replace(&placeholder, replacement);
    }

    serde_json::from_str(&result).unwrap_or_else(|_| step.clone())
}

/// Resolve variables whose values reference other variables (one level).
pub fn interpolate_str(value: &str, vars: &HashMap<String, String>) -> String {
    vars.iter().fold(value.to_string(), |acc, (key, v)| {
        acc.replace(&format!("${{{}}}", key), v)
    })
}
