// keyword moderation gate
// plain substring match on the lowercased prompt, so "skill" trips "kill"

use serde::Serialize;

const BLOCKED_TERMS: [&str; 12] = [
    "violence",
    "weapon",
    "hate",
    "kill",
    "hurt",
    "bomb",
    "gun",
    "inappropriate",
    "sexual",
    "drug",
    "alcohol",
    "suicide",
];

#[derive(Debug, Clone)]
pub struct Moderation {
    terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Default for Moderation {
    fn default() -> Self {
        Self::new(BLOCKED_TERMS)
    }
}

impl Moderation {
    /// Builds a gate from any term list. Terms are lowercased and blanks dropped.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn evaluate(&self, prompt: &str) -> Verdict {
        let lower = prompt.to_lowercase();

        match self.terms.iter().find(|t| lower.contains(t.as_str())) {
            Some(term) => Verdict {
                flagged: true,
                reason: Some(format!("matched blocked term \"{term}\"")),
            },
            None => Verdict {
                flagged: false,
                reason: None,
            },
        }
    }
}
