//! Happy and sad recognizer sets for a single expect step.

use regex::bytes::Regex;

/// What one expect step waits for.
///
/// Happy recognizers signal progress to the next step; sad recognizers signal
/// an explicit, named failure. Happy recognizers are always evaluated first.
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    happy: Vec<Regex>,
    sad: Vec<Regex>,
}

impl Expectation {
    /// Create an expectation with a single happy recognizer.
    pub fn new(happy: &Regex) -> Self {
        Self {
            happy: vec![happy.clone()],
            sad: Vec::new(),
        }
    }

    /// Add another happy recognizer, lower priority than those already added.
    pub fn or(mut self, happy: &Regex) -> Self {
        self.happy.push(happy.clone());
        self
    }

    /// Add a happy recognizer if present.
    pub fn or_maybe(self, happy: Option<&Regex>) -> Self {
        match happy {
            Some(re) => self.or(re),
            None => self,
        }
    }

    /// Add a sad recognizer if present.
    pub fn unless_maybe(mut self, sad: Option<&Regex>) -> Self {
        if let Some(re) = sad {
            self.sad.push(re.clone());
        }
        self
    }

    /// Add a sad recognizer.
    pub fn unless(mut self, sad: &Regex) -> Self {
        self.sad.push(sad.clone());
        self
    }

    /// Happy recognizers in priority order.
    pub fn happy(&self) -> &[Regex] {
        &self.happy
    }

    /// Sad recognizers in priority order.
    pub fn sad(&self) -> &[Regex] {
        &self.sad
    }

    /// Human readable list of recognizers, for errors and logs.
    pub fn describe(&self) -> String {
        let list = |patterns: &[Regex]| {
            patterns
                .iter()
                .map(|re| re.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        if self.sad.is_empty() {
            format!("[{}]", list(&self.happy))
        } else {
            format!("[{}] unless [{}]", list(&self.happy), list(&self.sad))
        }
    }
}
