//! Route registry
//!
//! Authoritative list of intents in registration order. Registration order is
//! the final tie-break when two matching intents share priority and distance.

use crate::error::{Result, RouterError};

/// A routable intent and the example utterances that define it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub name: String,
    /// Lower value wins when several intents match
    pub priority: u32,
    pub examples: Vec<String>,
}

impl Intent {
    /// Validate and normalise a new intent
    ///
    /// Names and examples are trimmed; whitespace is the only normalisation applied.
    pub fn new(name: &str, priority: u32, examples: &[impl AsRef<str>]) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RouterError::validation("intent name must not be empty"));
        }
        if priority == 0 {
            return Err(RouterError::validation(format!(
                "intent '{}': priority must be a positive integer",
                name
            )));
        }
        if examples.is_empty() {
            return Err(RouterError::validation(format!(
                "intent '{}' has no examples",
                name
            )));
        }

        let mut cleaned = Vec::with_capacity(examples.len());
        for (i, example) in examples.iter().enumerate() {
            let example = example.as_ref().trim();
            if example.is_empty() {
                return Err(RouterError::validation(format!(
                    "intent '{}': example {} is empty",
                    name, i
                )));
            }
            cleaned.push(example.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            priority,
            examples: cleaned,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    intents: Vec<Intent>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intent; fails on duplicate names or invalid examples
    pub fn add_intent(
        &mut self,
        name: &str,
        priority: u32,
        examples: &[impl AsRef<str>],
    ) -> Result<&Intent> {
        let intent = Intent::new(name, priority, examples)?;
        self.push(intent)
    }

    /// Register an already validated intent
    pub(crate) fn push(&mut self, intent: Intent) -> Result<&Intent> {
        if self.contains(&intent.name) {
            return Err(RouterError::validation(format!(
                "intent '{}' is already registered",
                intent.name
            )));
        }
        self.intents.push(intent);
        Ok(&self.intents[self.intents.len() - 1])
    }

    /// Intents in registration order
    pub fn list_intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn get(&self, name: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Total number of example utterances across all intents
    pub fn total_examples(&self) -> usize {
        self.intents.iter().map(|i| i.examples.len()).sum()
    }
}
