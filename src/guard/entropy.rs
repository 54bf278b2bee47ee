//! Shannon entropy over the character distribution of a string.

use std::collections::HashMap;

/// Shannon entropy (base 2, bits per character) of `text`.
///
/// Characters are Unicode scalar values. The empty string has entropy 0.
/// A text of `n` distinct characters never exceeds `log2(n)`.
pub fn shannon_entropy(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total: usize = 0;
    for c in text.chars() {
        let slot = counts.entry(c).or_insert(0);
        *slot = slot.saturating_add(1);
        total = total.saturating_add(1);
    }
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)] // character counts are far below 2^52
    let total = total as f64;
    counts
        .values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}
