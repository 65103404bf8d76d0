use std::collections::HashMap;

use crate::mood::Mood;

/// Last successful content per mood. Lives for the process, no expiry.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<Mood, String>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mood: Mood) -> Option<&str> {
        self.entries.get(&mood).map(String::as_str)
    }

    /// Store content for a mood, replacing any previous entry.
    pub fn put(&mut self, mood: Mood, content: String) {
        self.entries.insert(mood, content);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
