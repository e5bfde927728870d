/// An issue returned by the candidate search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticket {
    pub key: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    /// Value of the configured status custom field, when the issue carries one.
    pub status_detail: Option<String>,
}

#[cfg(test)]
impl Ticket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A workflow edge currently available on an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

/// Finds the transition whose display name matches exactly (case-sensitive).
pub fn find_transition<'a>(transitions: &'a [Transition], name: &str) -> Option<&'a Transition> {
    transitions.iter().find(|transition| transition.name == name)
}

/// A knowledge-base page that may help answer a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeArticle {
    pub title: String,
    pub excerpt: String,
    pub url: Option<String>,
}
