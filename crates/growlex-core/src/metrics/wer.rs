//! Word error rate over whitespace-tokenized text

/// Word error rate of `hypothesis` against `reference`, clipped to
/// `[0, 1]` so heavily hallucinated transcripts cannot dominate a mean.
pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let reference: Vec<&str> = reference.split_whitespace().collect();
    let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();
    if reference.is_empty() {
        return if hypothesis.is_empty() { 0.0 } else { 1.0 };
    }
    let distance = edit_distance(&reference, &hypothesis);
    (distance as f64 / reference.len() as f64).min(1.0)
}

/// Word-level Levenshtein distance, two-row dynamic program.
fn edit_distance(a: &[&str], b: &[&str]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, word_a) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, word_b) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(word_a != word_b);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
