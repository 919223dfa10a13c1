//! BLEU over whitespace-tokenized text
//!
//! Geometric mean of modified n-gram precisions up to order 4, times a
//! brevity penalty. The order is capped by the shorter of the two texts
//! so a two-word transcript that matches its two-word reference scores
//! 1.0 instead of collapsing on an impossible 4-gram.

use std::collections::HashMap;

const MAX_ORDER: usize = 4;

/// BLEU score of `hypothesis` against `reference`, in `[0, 1]`.
pub fn bleu_score(reference: &str, hypothesis: &str) -> f64 {
    let reference: Vec<&str> = reference.split_whitespace().collect();
    let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();
    if reference.is_empty() || hypothesis.is_empty() {
        return 0.0;
    }

    let order_cap = reference.len().min(hypothesis.len()).min(MAX_ORDER);
    let mut log_sum = 0.0;
    for order in 1..=order_cap {
        let precision = modified_precision(&reference, &hypothesis, order);
        if precision == 0.0 {
            return 0.0;
        }
        log_sum += precision.ln();
    }
    let geometric_mean = (log_sum / order_cap as f64).exp();

    let brevity_penalty = if hypothesis.len() >= reference.len() {
        1.0
    } else {
        (1.0 - reference.len() as f64 / hypothesis.len() as f64).exp()
    };

    (geometric_mean * brevity_penalty).clamp(0.0, 1.0)
}

/// Fraction of hypothesis n-grams also present in the reference, with
/// each n-gram's credit clipped at its reference count.
fn modified_precision(reference: &[&str], hypothesis: &[&str], order: usize) -> f64 {
    let reference_counts = ngram_counts(reference, order);
    let hypothesis_counts = ngram_counts(hypothesis, order);
    let total: usize = hypothesis_counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let matched: usize = hypothesis_counts
        .iter()
        .map(|(gram, &count)| count.min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();
    matched as f64 / total as f64
}

fn ngram_counts<'a>(words: &[&'a str], order: usize) -> HashMap<Vec<&'a str>, usize> {
    let mut counts = HashMap::new();
    if words.len() >= order {
        for gram in words.windows(order) {
            *counts.entry(gram.to_vec()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_score_one() {
        assert!((bleu_score("kill the light tonight", "kill the light tonight") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_perfect_match_scores_one() {
        // Two words, so only 1-grams and 2-grams exist.
        assert!((bleu_score("kill light", "kill light") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert_eq!(bleu_score("kill the light", "burn every bridge"), 0.0);
    }

    #[test]
    fn test_empty_hypothesis_scores_zero() {
        assert_eq!(bleu_score("kill the light", ""), 0.0);
    }

    #[test]
    fn test_partial_overlap_is_strictly_between() {
        let score = bleu_score(
            "kill the light tonight my friend",
            "kill the light tonight my enemy",
        );
        assert!(score > 0.0 && score < 1.0, "got {score}");
    }

    #[test]
    fn test_repeated_word_credit_is_clipped() {
        // "the" appears once in the reference, so only one of the two
        // hypothesis copies earns 1-gram credit.
        let score = bleu_score("the", "the the");
        assert!((score - 0.5).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn test_brevity_penalty_punishes_truncation() {
        let full = bleu_score("kill the light tonight", "kill the light tonight");
        let truncated = bleu_score("kill the light tonight", "kill the light");
        assert!(truncated < full);
        assert!(truncated > 0.0);
    }
}
