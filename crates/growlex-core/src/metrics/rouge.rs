//! ROUGE-L F-measure over whitespace-tokenized text

/// ROUGE-L F1 of `hypothesis` against `reference`, in `[0, 1]`.
///
/// Precision and recall both come from the longest common subsequence
/// of words, so ordering matters but contiguity does not.
pub fn rouge_l_f1(reference: &str, hypothesis: &str) -> f64 {
    let reference: Vec<&str> = reference.split_whitespace().collect();
    let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();
    if reference.is_empty() || hypothesis.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&reference, &hypothesis) as f64;
    if lcs == 0.0 {
        return 0.0;
    }
    let precision = lcs / hypothesis.len() as f64;
    let recall = lcs / reference.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

/// Longest common subsequence length, two-row dynamic program.
fn lcs_length(a: &[&str], b: &[&str]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for word_a in a {
        for (j, word_b) in b.iter().enumerate() {
            curr[j + 1] = if word_a == word_b {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
