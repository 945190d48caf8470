use std::collections::{HashMap, HashSet};

use super::normalize::keyword_tokens;

/// Maximum number of missing keywords reported.
pub const MAX_MISSING_KEYWORDS: usize = 10;

/// Job-description terms absent from the résumé.
///
/// Candidates are ranked by how often they occur in the job description
/// (most frequent first), ties broken alphabetically, and capped at
/// `MAX_MISSING_KEYWORDS`. The result is fully deterministic for a given input.
pub fn missing_keywords(job_description: &str, resume: &str) -> Vec<String> {
    let present: HashSet<String> = keyword_tokens(resume).into_iter().collect();

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for token in keyword_tokens(job_description) {
        if !present.contains(&token) {
            *frequency.entry(token).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = frequency.into_iter().collect();
    ranked.sort_by(|(a, fa), (b, fb)| fb.cmp(fa).then_with(|| a.cmp(b)));
    ranked
        .into_iter()
        .take(MAX_MISSING_KEYWORDS)
        .map(|(term, _)| term)
        .collect()
}
