use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::error::{Result, ShapeError};
use crate::models::{RankedPeer, Ranking, Respondent, RespondentRanking, Schema};
use crate::scoring;

/// Ranks every respondent of one cohort against all of their peers.
///
/// Peers are ordered by ascending difference and truncated to `limit`.
/// Ties keep the input order of `respondents`. Any schema or shape error
/// aborts the whole pass.
pub fn rank(
    schema: &Schema,
    cohort: &str,
    respondents: &[Respondent],
    limit: usize,
) -> Result<Ranking> {
    schema.validate()?;
    check_shape(schema, cohort, respondents)?;

    let mut entries = Vec::with_capacity(respondents.len());

    for (index, respondent) in respondents.iter().enumerate() {
        let mut peers = Vec::with_capacity(respondents.len().saturating_sub(1));

        for (other_index, other) in respondents.iter().enumerate() {
            if index == other_index {
                continue;
            }

            peers.push(RankedPeer {
                peer_id: other.id.clone(),
                score: scoring::compare(schema, respondent, other)?,
            });
        }

        // Stable, so equal differences stay in input order.
        peers.sort_by(|a, b| a.score.difference.total_cmp(&b.score.difference));
        peers.truncate(limit);

        entries.push(RespondentRanking {
            respondent_id: respondent.id.clone(),
            peers,
        });
    }

    debug!(cohort, respondents = respondents.len(), "cohort ranked");

    Ok(Ranking {
        cohort: cohort.to_string(),
        entries,
    })
}

fn check_shape(schema: &Schema, cohort: &str, respondents: &[Respondent]) -> Result<()> {
    let expected = schema.number_of_questions();

    for respondent in respondents {
        if respondent.cohort != cohort {
            return Err(ShapeError::MixedCohort {
                respondent: respondent.id.clone(),
                expected: cohort.to_string(),
                actual: respondent.cohort.clone(),
            }
            .into());
        }

        if respondent.answers.len() != expected {
            return Err(ShapeError::AnswerCount {
                respondent: respondent.id.clone(),
                expected,
                actual: respondent.answers.len(),
            }
            .into());
        }
    }

    Ok(())
}

/// Ranks several cohorts concurrently, one blocking task per cohort.
///
/// Results come back in the order the cohorts were given.
pub async fn rank_cohorts(
    schema: Arc<Schema>,
    cohorts: Vec<(String, Vec<Respondent>)>,
    limit: usize,
) -> anyhow::Result<Vec<Ranking>> {
    let mut handles = Vec::with_capacity(cohorts.len());

    for (cohort, respondents) in cohorts {
        let schema = Arc::clone(&schema);
        let label = cohort.clone();
        let handle =
            tokio::task::spawn_blocking(move || rank(&schema, &cohort, &respondents, limit));
        handles.push((label, handle));
    }

    let mut rankings = Vec::with_capacity(handles.len());
    for (cohort, handle) in handles {
        let ranking = handle
            .await
            .with_context(|| format!("ranking task for cohort {cohort} failed"))?
            .with_context(|| format!("failed to rank cohort {cohort}"))?;
        info!(cohort = %cohort, respondents = ranking.len(), "cohort ready");
        rankings.push(ranking);
    }

    Ok(rankings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, MatchError};
    use crate::models::{Question, QuestionKind};

    fn schema() -> Schema {
        Schema {
            questions: vec![
                Question {
                    prompt: "Q1".to_string(),
                    answers: vec!["A".to_string(), "B".to_string()],
                    kind: QuestionKind::Distinct,
                },
                Question {
                    prompt: "Q2".to_string(),
                    answers: vec!["1".to_string(), "2".to_string(), "3".to_string()],
                    kind: QuestionKind::Ranked,
                },
            ],
        }
    }

    fn respondent(id: &str, cohort: &str, answers: [&str; 2]) -> Respondent {
        Respondent {
            id: id.to_string(),
            cohort: cohort.to_string(),
            answers: answers
                .iter()
                .map(|answer| (!answer.is_empty()).then(|| answer.to_string()))
                .collect(),
        }
    }

    fn cohort() -> Vec<Respondent> {
        vec![
            respondent("x", "9th", ["A", "2"]),
            respondent("y", "9th", ["B", "2"]),
            respondent("z", "9th", ["A", "1"]),
            respondent("w", "9th", ["B", "3"]),
            respondent("v", "9th", ["", ""]),
        ]
    }

    fn peer_ids(ranking: &Ranking, id: &str) -> Vec<String> {
        ranking
            .peers_of(id)
            .unwrap()
            .iter()
            .map(|peer| peer.peer_id.clone())
            .collect()
    }

    #[test]
    fn ranks_worked_example() {
        let respondents = vec![
            respondent("x", "9th", ["A", "2"]),
            respondent("y", "9th", ["B", "2"]),
            respondent("z", "9th", ["A", "1"]),
        ];
        let ranking = rank(&schema(), "9th", &respondents, 10).unwrap();
        let peers = ranking.peers_of("x").unwrap();

        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].peer_id, "z");
        assert_eq!(peers[0].score.difference, 0.5);
        assert_eq!(peers[1].peer_id, "y");
        assert_eq!(peers[1].score.difference, 1.0);
    }

    #[test]
    fn peers_are_sorted_by_difference() {
        let ranking = rank(&schema(), "9th", &cohort(), 10).unwrap();
        for entry in &ranking.entries {
            for pair in entry.peers.windows(2) {
                assert!(pair[0].score.difference <= pair[1].score.difference);
            }
            assert!(entry.peers.iter().all(|peer| peer.peer_id != entry.respondent_id));
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let respondents = vec![
            respondent("x", "9th", ["A", "2"]),
            respondent("b", "9th", ["B", "2"]),
            respondent("a", "9th", ["B", "2"]),
            respondent("c", "9th", ["B", "2"]),
        ];
        let ranking = rank(&schema(), "9th", &respondents, 10).unwrap();
        assert_eq!(peer_ids(&ranking, "x"), vec!["b", "a", "c"]);
    }

    #[test]
    fn truncates_to_limit() {
        let respondents = cohort();
        for limit in [0, 1, 3, 4, 10] {
            let ranking = rank(&schema(), "9th", &respondents, limit).unwrap();
            for entry in &ranking.entries {
                assert_eq!(entry.peers.len(), limit.min(respondents.len() - 1));
            }
        }
    }

    #[test]
    fn entries_follow_input_order() {
        let ranking = rank(&schema(), "9th", &cohort(), 3).unwrap();
        let ids: Vec<_> = ranking
            .entries
            .iter()
            .map(|entry| entry.respondent_id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "y", "z", "w", "v"]);
    }

    #[test]
    fn small_cohorts_are_not_errors() {
        let empty = rank(&schema(), "9th", &[], 10).unwrap();
        assert!(empty.is_empty());

        let single = rank(&schema(), "9th", &[respondent("x", "9th", ["A", "1"])], 10).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.peers_of("x").unwrap().len(), 0);
    }

    #[test]
    fn malformed_schema_aborts_the_pass() {
        let mut schema = schema();
        schema.questions[1].answers.truncate(1);
        let err = rank(&schema, "9th", &cohort(), 10).unwrap_err();
        assert!(matches!(err, MatchError::Config(ConfigError::DegenerateScale { .. })));
    }

    #[test]
    fn mixed_cohorts_are_rejected() {
        let respondents = vec![
            respondent("x", "9th", ["A", "2"]),
            respondent("y", "10th", ["B", "2"]),
        ];
        let err = rank(&schema(), "9th", &respondents, 10).unwrap_err();
        assert!(matches!(err, MatchError::Shape(ShapeError::MixedCohort { .. })));
    }

    #[test]
    fn short_answer_vectors_are_rejected() {
        let mut respondents = cohort();
        respondents[2].answers.pop();
        let err = rank(&schema(), "9th", &respondents, 10).unwrap_err();
        assert!(matches!(err, MatchError::Shape(ShapeError::AnswerCount { .. })));
    }

    #[tokio::test]
    async fn ranks_cohorts_in_given_order() {
        let cohorts = vec![
            ("9th".to_string(), cohort()),
            ("10th".to_string(), vec![
                respondent("p", "10th", ["A", "1"]),
                respondent("q", "10th", ["A", "3"]),
            ]),
            ("11th".to_string(), Vec::new()),
        ];
        let rankings = rank_cohorts(Arc::new(schema()), cohorts, 3).await.unwrap();

        let names: Vec<_> = rankings.iter().map(|ranking| ranking.cohort.as_str()).collect();
        assert_eq!(names, vec!["9th", "10th", "11th"]);
        assert_eq!(rankings[0], rank(&schema(), "9th", &cohort(), 3).unwrap());
        assert_eq!(rankings[1].peers_of("p").unwrap()[0].score.difference, 1.0);
        assert!(rankings[2].is_empty());
    }
}
