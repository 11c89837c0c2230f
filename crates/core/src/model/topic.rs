use thiserror::Error;

use crate::model::ids::TopicId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic name cannot be empty")]
    EmptyName,
}

//
// ─── TOPIC ─────────────────────────────────────────────────────────────────────
//

/// A subject area grouping quiz questions.
///
/// Topics are reference data: admin tooling creates them, the engine only reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    id: TopicId,
    name: String,
    description: Option<String>,
}

impl Topic {
    /// Creates a new Topic.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: TopicId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TopicError::EmptyName);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            description,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TopicId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_new_rejects_empty_name() {
        let err = Topic::new(TopicId::new(1), "   ", None).unwrap_err();
        assert_eq!(err, TopicError::EmptyName);
    }

    #[test]
    fn topic_new_happy_path() {
        let topic = Topic::new(
            TopicId::new(10),
            "Early Medieval History",
            Some("IX-XII centuries".into()),
        )
        .unwrap();

        assert_eq!(topic.id(), TopicId::new(10));
        assert_eq!(topic.name(), "Early Medieval History");
        assert_eq!(topic.description(), Some("IX-XII centuries"));
    }

    #[test]
    fn topic_trims_name_and_filters_empty_description() {
        let topic = Topic::new(TopicId::new(1), "  Geography  ", Some("   ".into())).unwrap();

        assert_eq!(topic.name(), "Geography");
        assert_eq!(topic.description(), None);
    }
}
