use crate::models::Respondent;

/// Distinct cohort tags in the order they first appear.
pub fn cohorts(respondents: &[Respondent]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for respondent in respondents {
        if !tags.iter().any(|tag| *tag == respondent.cohort) {
            tags.push(respondent.cohort.clone());
        }
    }
    tags
}

pub fn filter_cohort(respondents: &[Respondent], cohort: &str) -> Vec<Respondent> {
    respondents
        .iter()
        .filter(|respondent| respondent.cohort == cohort)
        .cloned()
        .collect()
}

/// Splits respondents into the requested cohorts, or every cohort present
/// when none are requested.
pub fn partition(respondents: &[Respondent], requested: &[String]) -> Vec<(String, Vec<Respondent>)> {
    let tags = if requested.is_empty() {
        cohorts(respondents)
    } else {
        requested.to_vec()
    };

    tags.into_iter()
        .map(|tag| {
            let members = filter_cohort(respondents, &tag);
            (tag, members)
        })
        .collect()
}
