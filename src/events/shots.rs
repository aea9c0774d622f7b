/// The shot taxonomy. Declared order is the row order of every table,
/// chart and export; never re-sort it.
pub const SHOT_TYPES: [&str; 12] = [
    "Smash",
    "Jump Smash",
    "Clear",
    "Drop",
    "Drive",
    "Lob",
    "Net Shot",
    "Push",
    "Rush",
    "Short Service",
    "Long Service",
    "Defensive Shot",
];

/// Label the pipeline uses for rejected / low-confidence detections.
const NEGATIVE_LABEL: &str = "negative";

/// Normalize a label for comparison: lowercase, `_` → space, trimmed.
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase().replace('_', " ").trim().to_string()
}

/// Whether a label is the "negative" sentinel (any case / underscore form).
pub fn is_negative(label: &str) -> bool {
    normalize_label(label) == NEGATIVE_LABEL
}

/// Position of the label's canonical shot type in [`SHOT_TYPES`], if any.
pub fn shot_index(label: &str) -> Option<usize> {
    let norm = normalize_label(label);
    SHOT_TYPES.iter().position(|s| normalize_label(s) == norm)
}

/// Canonical shot type name for a raw label, if it matches one.
pub fn canonical_shot(label: &str) -> Option<&'static str> {
    shot_index(label).map(|i| SHOT_TYPES[i])
}

/// Display form of a label.
///
/// Canonical labels take the taxonomy's exact spelling. Anything else is
/// humanized: split on `_`, first letter of each token upper-cased.
pub fn display_label(label: &str) -> String {
    if let Some(shot) = canonical_shot(label) {
        return shot.to_string();
    }
    label
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
