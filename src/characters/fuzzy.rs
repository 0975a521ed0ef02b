//! Fuzzy string similarity on a 0–100 scale.
//!
//! Similarity is the normalized Indel distance: `2 * LCS / (len_a + len_b)`.
//! The partial variant slides the shorter string over the longer one and
//! keeps the best window, so a query matches anywhere inside a longer
//! descriptor.

/// Lowercases, turns every non-alphanumeric character into a space and trims.
pub fn default_process(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_lowercase().next().unwrap_or(ch)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn sorted_tokens(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &left in a {
        for (j, &right) in b.iter().enumerate() {
            current[j + 1] = if left == right {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn indel_similarity(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_similarity(&a, &b)
}

pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len() as isize;
    let n = long.len() as isize;
    let mut best = 0.0f64;
    // Windows hanging off either end are included, as partial alignments.
    for start in (1 - m)..n {
        let from = start.max(0) as usize;
        let to = (start + m).min(n) as usize;
        let score = indel_similarity(&short, &long[from..to]);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// Token-order-insensitive partial similarity, rounded like the usual
/// integer fuzzy scores. Strings that are empty after processing score 0.
pub fn partial_token_sort_ratio(a: &str, b: &str) -> u8 {
    let a = sorted_tokens(&default_process(a));
    let b = sorted_tokens(&default_process(b));
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    partial_ratio(&a, &b).round().clamp(0.0, 100.0) as u8
}
