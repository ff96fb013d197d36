//! Name normalization and similarity scoring for the identity resolver's
//! exact and fuzzy passes.

const CORPORATE_SUFFIXES: &[&str] = &[
    "inc", "llc", "ltd", "gmbh", "plc", "pty", "co", "corp", "sa", "bv",
];

/// lower-case, strip diacritics, collapse whitespace, drop a trailing
/// corporate suffix from the closed set, then strip non-alphanumerics.
pub(crate) fn normalize_name(name: &str) -> String {
    let folded = fold_diacritics(&name.to_lowercase());
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_suffix = strip_trailing_suffix(&collapsed);
    without_suffix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Same as `normalize_name` but keeps whitespace, for tokenization.
fn normalize_keep_tokens(name: &str) -> String {
    let folded = fold_diacritics(&name.to_lowercase());
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    strip_trailing_suffix(&collapsed)
}

fn strip_trailing_suffix(normalized: &str) -> String {
    let tokens: Vec<&str> = normalized.split(' ').collect();
    if tokens.len() > 1 {
        if let Some(last) = tokens.last() {
            let bare: String = last.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            if CORPORATE_SUFFIXES.contains(&bare.as_str()) {
                return tokens[..tokens.len() - 1].join(" ");
            }
        }
    }
    normalized.to_string()
}

/// Folds common Latin-1/Latin Extended diacritics to their ASCII base
/// letter. No Unicode-normalization crate is in this stack, so the mapping
/// is spelled out explicitly rather than pulled in via NFD decomposition.
fn fold_diacritics(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
            'è' | 'é' | 'ê' | 'ë' | 'ē' => 'e',
            'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ō' | 'ø' => 'o',
            'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
            'ý' | 'ÿ' => 'y',
            'ñ' => 'n',
            'ç' => 'c',
            'ß' => 's',
            other => other,
        })
        .collect()
}

/// Token-set similarity: `2*|A∩B| / (|A|+|B|)` over whitespace tokens of the
/// normalized forms. Single-token pairs fall back to normalized
/// edit-distance similarity.
pub(crate) fn similarity(name_a: &str, name_b: &str) -> f64 {
    let norm_a = normalize_keep_tokens(name_a);
    let norm_b = normalize_keep_tokens(name_b);

    let tokens_a: Vec<&str> = norm_a.split(' ').filter(|t| !t.is_empty()).collect();
    let tokens_b: Vec<&str> = norm_b.split(' ').filter(|t| !t.is_empty()).collect();

    if tokens_a.len() <= 1 && tokens_b.len() <= 1 {
        return edit_distance_similarity(&norm_a, &norm_b);
    }

    let set_a: std::collections::HashSet<&str> = tokens_a.into_iter().collect();
    let set_b: std::collections::HashSet<&str> = tokens_b.into_iter().collect();
    let intersection = set_a.intersection(&set_b).count();
    let denom = set_a.len() + set_b.len();
    if denom == 0 {
        0.0
    } else {
        2.0 * intersection as f64 / denom as f64
    }
}

fn edit_distance_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - (distance as f64 / max_len as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_corporate_suffix_and_punctuation() {
        assert_eq!(normalize_name("Acme, Inc."), normalize_name("ACME"));
    }

    #[test]
    fn collapses_whitespace_and_case() {
        assert_eq!(normalize_name("  Blue   Sky  "), "bluesky");
    }

    #[test]
    fn folds_diacritics() {
        assert_eq!(normalize_name("Café Münchën"), normalize_name("Cafe Munchen"));
    }

    #[test]
    fn identical_names_score_one() {
        assert_eq!(similarity("Acme Corp", "Acme Corp"), 1.0);
    }

    #[test]
    fn single_token_uses_edit_distance() {
        let s = similarity("Acme", "Acem");
        assert!(s > 0.5 && s < 1.0);
    }
}
