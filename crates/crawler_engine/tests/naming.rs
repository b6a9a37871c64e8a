use crawler_engine::{derived_name, NAME_MAX_LEN};

#[test]
fn structural_characters_become_underscores() {
    assert_eq!(
        derived_name("http://a.example/x"),
        "http___a.example_x"
    );
    assert_eq!(derived_name("page#section/one:two"), "page_section_one_two");
}

#[test]
fn short_names_pass_through_unshortened() {
    let name = derived_name("plain-name.html");
    assert_eq!(name, "plain-name.html");
    assert!(name.len() < NAME_MAX_LEN);
}

#[test]
fn long_names_are_truncated_with_digest_suffix() {
    let hint = format!("http://long.example/{}", "a".repeat(300));
    let name = derived_name(&hint);
    assert_eq!(name.len(), NAME_MAX_LEN);
    // Prefix survives truncation; suffix is the 64-char hex digest.
    assert!(name.starts_with("http___long.example_aaaa"));
}

#[test]
fn name_at_ceiling_is_shortened_too() {
    // Sanitized length exactly at the ceiling triggers shortening.
    let hint = "a".repeat(NAME_MAX_LEN);
    let name = derived_name(&hint);
    assert_ne!(name, hint);
    assert!(name.len() <= NAME_MAX_LEN);
}

#[test]
fn derivation_is_deterministic_across_calls() {
    let hint = format!("http://long.example/{}", "b".repeat(500));
    assert_eq!(derived_name(&hint), derived_name(&hint));
}

#[test]
fn inputs_sharing_a_prefix_do_not_collide_after_truncation() {
    let shared = "c".repeat(200);
    let first = derived_name(&format!("{shared}-one"));
    let second = derived_name(&format!("{shared}-two"));
    assert_eq!(first.len(), NAME_MAX_LEN);
    assert_eq!(second.len(), NAME_MAX_LEN);
    assert_ne!(first, second);
}

#[test]
fn multibyte_names_are_cut_on_char_boundaries() {
    let hint = "é".repeat(NAME_MAX_LEN); // 2 bytes per char
    let name = derived_name(&hint);
    assert!(name.len() <= NAME_MAX_LEN);
    assert!(name.is_char_boundary(name.len() - 64));
}
