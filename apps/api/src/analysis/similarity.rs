//! TF-IDF cosine similarity over the two-document corpus {job description, résumé}.
//!
//! Weighting follows the common smoothed scheme:
//! `tf` = raw count, `idf(t) = ln((1 + n) / (1 + df(t))) + 1` with `n = 2`.
//! Cosine similarity is invariant to the L2 normalization usually applied to
//! the vectors, so it is folded into the final division. The vocabulary is
//! built per call and never shared between requests.

use std::collections::{BTreeMap, BTreeSet};

use super::normalize::tfidf_tokens;

const CORPUS_SIZE: f64 = 2.0;

type TermCounts = BTreeMap<String, usize>;

/// Similarity of the résumé to the job description as a percentage in
/// `[0, 100]`, rounded to two decimals. Either side having no terms after
/// stop-word removal yields `0.0`.
pub fn match_score(job_description: &str, resume: &str) -> f64 {
    let jd = term_counts(job_description);
    let cv = term_counts(resume);
    if jd.is_empty() || cv.is_empty() {
        return 0.0;
    }

    let vocabulary: BTreeSet<&str> = jd.keys().chain(cv.keys()).map(String::as_str).collect();
    let idf = |term: &str| {
        let df = u8::from(jd.contains_key(term)) + u8::from(cv.contains_key(term));
        ((1.0 + CORPUS_SIZE) / (1.0 + f64::from(df))).ln() + 1.0
    };
    let weigh = |counts: &TermCounts| -> Vec<f64> {
        vocabulary
            .iter()
            .map(|&t| counts.get(t).map_or(0.0, |&c| c as f64 * idf(t)))
            .collect()
    };

    let similarity = cosine(&weigh(&jd), &weigh(&cv));
    round2((similarity * 100.0).clamp(0.0, 100.0))
}

fn term_counts(text: &str) -> TermCounts {
    let mut counts = TermCounts::new();
    for token in tfidf_tokens(text) {
        *counts.entry(token).or_default() += 1;
    }
    counts
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
