use foodgram::services::reference_service::{is_hex_color, slugify};

#[test]
fn slug_joins_lowercased_words() {
    assert_eq!(slugify("Breakfast"), "breakfast");
    assert_eq!(slugify("  Late Night  Snack! "), "late-night-snack");
    assert_eq!(slugify("---"), "");
}

#[test]
fn slug_is_truncated_without_trailing_dash() {
    let name = format!("{} tail", "a".repeat(49));
    let slug = slugify(&name);
    assert_eq!(slug, "a".repeat(49));
}

#[test]
fn colors_must_be_hash_rrggbb() {
    assert!(is_hex_color("#E26C2D"));
    assert!(is_hex_color("#abcdef"));
    assert!(!is_hex_color("E26C2D"));
    assert!(!is_hex_color("#E26C2"));
    assert!(!is_hex_color("#GGGGGG"));
}
