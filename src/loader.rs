use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, ShapeError};
use crate::models::{Question, QuestionKind, Respondent, Schema};

/// Timestamp, respondent id, cohort; answers start after these.
pub const ID_COLUMN: usize = 1;
pub const COHORT_COLUMN: usize = 2;
pub const FIRST_QUESTION_COLUMN: usize = 3;

pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let schema =
        parse_schema(&raw).with_context(|| format!("invalid schema {}", path.display()))?;
    info!(
        path = %path.display(),
        questions = schema.number_of_questions(),
        "schema loaded"
    );
    Ok(schema)
}

pub fn parse_schema(raw: &str) -> anyhow::Result<Schema> {
    #[derive(Deserialize)]
    struct SchemaFile {
        questions: Vec<QuestionEntry>,
    }

    #[derive(Deserialize)]
    struct QuestionEntry {
        prompt: String,
        answers: Vec<String>,
        #[serde(rename = "type")]
        kind: String,
    }

    let file: SchemaFile = serde_json::from_str(raw)?;
    let mut questions = Vec::with_capacity(file.questions.len());

    for (position, entry) in file.questions.into_iter().enumerate() {
        let kind = entry
            .kind
            .parse::<QuestionKind>()
            .map_err(|kind| ConfigError::UnknownKind {
                position,
                prompt: entry.prompt.clone(),
                kind,
            })?;
        questions.push(Question {
            prompt: entry.prompt,
            answers: entry.answers,
            kind,
        });
    }

    Ok(Schema::new(questions)?)
}

pub fn load_responses(path: &Path, schema: &Schema) -> anyhow::Result<Vec<Respondent>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open responses {}", path.display()))?;
    let respondents = parse_responses(file, schema)
        .with_context(|| format!("invalid responses {}", path.display()))?;
    info!(
        path = %path.display(),
        respondents = respondents.len(),
        "responses loaded"
    );
    Ok(respondents)
}

/// Reads a tab-separated response table and checks it against `schema`.
pub fn parse_responses<R: Read>(input: R, schema: &Schema) -> anyhow::Result<Vec<Respondent>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    check_header(&headers, schema)?;

    let expected_columns = FIRST_QUESTION_COLUMN + schema.number_of_questions();
    let mut seen = HashSet::new();
    let mut respondents = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let row = index + 2;

        if record.len() != expected_columns {
            return Err(ShapeError::ColumnCount {
                row,
                expected: expected_columns,
                actual: record.len(),
            }
            .into());
        }

        let id = record.get(ID_COLUMN).unwrap_or_default().to_string();
        if id.is_empty() {
            return Err(ShapeError::MissingId { row }.into());
        }
        if !seen.insert(id.clone()) {
            return Err(ShapeError::DuplicateRespondent { row, respondent: id }.into());
        }

        let mut answers = Vec::with_capacity(schema.number_of_questions());
        for (position, (cell, question)) in record
            .iter()
            .skip(FIRST_QUESTION_COLUMN)
            .zip(schema.questions.iter())
            .enumerate()
        {
            if cell.is_empty() {
                answers.push(None);
                continue;
            }

            if !question.allows(cell) {
                return Err(ShapeError::AnswerOutsideDomain {
                    respondent: id,
                    position,
                    prompt: question.prompt.clone(),
                    answer: cell.to_string(),
                }
                .into());
            }
            answers.push(Some(cell.to_string()));
        }

        respondents.push(Respondent {
            id,
            cohort: record.get(COHORT_COLUMN).unwrap_or_default().to_string(),
            answers,
        });
    }

    Ok(respondents)
}

fn check_header(headers: &csv::StringRecord, schema: &Schema) -> Result<(), ShapeError> {
    let prompts: Vec<&str> = headers.iter().skip(FIRST_QUESTION_COLUMN).collect();

    if prompts.len() != schema.number_of_questions() {
        return Err(ShapeError::QuestionCount {
            expected: schema.number_of_questions(),
            actual: prompts.len(),
        });
    }

    for (position, (column, question)) in prompts.iter().zip(schema.questions.iter()).enumerate() {
        if *column != question.prompt {
            return Err(ShapeError::PromptMismatch {
                position,
                expected: question.prompt.clone(),
                actual: column.to_string(),
            });
        }
    }

    Ok(())
}
