use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

/// Schema problems. Retrying with the same schema reproduces them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("schema has no questions")]
    NoQuestions,

    #[error("question {position} ({prompt:?}) has unknown type {kind:?}, expected \"distinct\" or \"ranked\"")]
    UnknownKind {
        position: usize,
        prompt: String,
        kind: String,
    },

    #[error("ranked question {position} ({prompt:?}) needs at least 2 answers, has {answers}")]
    DegenerateScale {
        position: usize,
        prompt: String,
        answers: usize,
    },
}

/// Responses that do not line up with the schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("response header has {actual} question columns, schema has {expected}")]
    QuestionCount { expected: usize, actual: usize },

    #[error("column for question {position} is {actual:?}, schema prompt is {expected:?}")]
    PromptMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("row {row} has {actual} columns, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} has no respondent id")]
    MissingId { row: usize },

    #[error("respondent {respondent} appears more than once (row {row})")]
    DuplicateRespondent { row: usize, respondent: String },

    #[error("respondent {respondent} answered {answer:?} to question {position} ({prompt:?}), which is not an allowed answer")]
    AnswerOutsideDomain {
        respondent: String,
        position: usize,
        prompt: String,
        answer: String,
    },

    #[error("respondent {respondent} has {actual} answers, schema has {expected} questions")]
    AnswerCount {
        respondent: String,
        expected: usize,
        actual: usize,
    },

    #[error("respondent {respondent} is in cohort {actual:?}, ranking pass is for {expected:?}")]
    MixedCohort {
        respondent: String,
        expected: String,
        actual: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("shape mismatch: {0}")]
    Shape(#[from] ShapeError),
}
