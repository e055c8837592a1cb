use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

/// How two answers to the same question are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Unordered choices; any mismatch is a full point of difference.
    Distinct,
    /// Choices on an ordered scale; distance grows with separation.
    Ranked,
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "distinct" => Ok(QuestionKind::Distinct),
            "ranked" => Ok(QuestionKind::Ranked),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub answers: Vec<String>,
    pub kind: QuestionKind,
}

impl Question {
    pub fn position(&self, answer: &str) -> Option<usize> {
        self.answers.iter().position(|candidate| candidate == answer)
    }

    pub fn allows(&self, answer: &str) -> bool {
        self.position(answer).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub questions: Vec<Question>,
}

impl Schema {
    pub fn new(questions: Vec<Question>) -> Result<Self, ConfigError> {
        let schema = Self { questions };
        schema.validate()?;
        Ok(schema)
    }

    /// Total question count, the denominator of every similarity score.
    pub fn number_of_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.questions.is_empty() {
            return Err(ConfigError::NoQuestions);
        }

        for (index, question) in self.questions.iter().enumerate() {
            if question.kind == QuestionKind::Ranked && question.answers.len() < 2 {
                return Err(ConfigError::DegenerateScale {
                    position: index,
                    prompt: question.prompt.clone(),
                    answers: question.answers.len(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Respondent {
    pub id: String,
    pub cohort: String,
    /// Aligned to `Schema::questions`; `None` means the question was skipped.
    pub answers: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    pub difference: f64,
    pub identical: usize,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPeer {
    pub peer_id: String,
    #[serde(flatten)]
    pub score: PairScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentRanking {
    pub respondent_id: String,
    pub peers: Vec<RankedPeer>,
}

/// Ranked peers for every respondent of one cohort, in respondent input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub cohort: String,
    pub entries: Vec<RespondentRanking>,
}

impl Ranking {
    #[cfg(test)]
    pub fn peers_of(&self, respondent_id: &str) -> Option<&[RankedPeer]> {
        self.entries
            .iter()
            .find(|entry| entry.respondent_id == respondent_id)
            .map(|entry| entry.peers.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
