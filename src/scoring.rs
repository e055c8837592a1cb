use crate::error::{Result, ShapeError};
use crate::models::{PairScore, Question, QuestionKind, Respondent, Schema};

/// Compares two respondents of the same cohort question by question.
///
/// Lower `difference` means more compatible. Answer vectors are expected to
/// be aligned with the schema already; the loader and `ranking::rank` check
/// that before any scoring happens.
pub fn score(schema: &Schema, a: &Respondent, b: &Respondent) -> Result<PairScore> {
    schema.validate()?;
    compare(schema, a, b)
}

/// `score` for a schema the caller has already validated.
pub(crate) fn compare(schema: &Schema, a: &Respondent, b: &Respondent) -> Result<PairScore> {
    let number_of_questions = schema.number_of_questions();

    let mut difference = 0.0;
    let mut identical = 0usize;

    for (position, ((answer, other_answer), question)) in a
        .answers
        .iter()
        .zip(b.answers.iter())
        .zip(schema.questions.iter())
        .enumerate()
    {
        let index = domain_position(position, question, &a.id, answer.as_deref())?;
        let other_index = domain_position(position, question, &b.id, other_answer.as_deref())?;

        // Two skipped answers count as agreement for every kind.
        if answer == other_answer {
            identical += 1;
            continue;
        }

        difference += match question.kind {
            QuestionKind::Distinct => 1.0,
            QuestionKind::Ranked => match (index, other_index) {
                (Some(index), Some(other_index)) => scale_distance(question, index, other_index),
                _ => 1.0,
            },
        };
    }

    Ok(PairScore {
        difference,
        identical,
        similarity: similarity(number_of_questions, difference),
    })
}

pub fn similarity(number_of_questions: usize, difference: f64) -> f64 {
    let total = number_of_questions as f64;
    (total - difference) / total * 100.0
}

/// Separation on a scale normalized to [0, 1]. `Schema::validate` guarantees
/// ranked questions have at least two steps.
fn scale_distance(question: &Question, index: usize, other_index: usize) -> f64 {
    index.abs_diff(other_index) as f64 / (question.answers.len() - 1) as f64
}

/// Position of a given answer in the question's domain, `None` when skipped.
fn domain_position(
    position: usize,
    question: &Question,
    respondent: &str,
    answer: Option<&str>,
) -> Result<Option<usize>> {
    let Some(answer) = answer else {
        return Ok(None);
    };

    match question.position(answer) {
        Some(index) => Ok(Some(index)),
        None => Err(ShapeError::AnswerOutsideDomain {
            respondent: respondent.to_string(),
            position,
            prompt: question.prompt.clone(),
            answer: answer.to_string(),
        }
        .into()),
    }
}
