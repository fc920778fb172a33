use foodgram::pdf::{LINES_PER_PAGE, encode_text, render_text_document};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|window| *window == needle).count()
}

#[test]
fn document_has_header_and_trailer() {
    let doc = render_text_document("Shopping list", &["flour - 500 g".to_string()]);

    assert!(doc.starts_with(b"%PDF-1.4\n"));
    assert!(doc.ends_with(b"%%EOF\n"));
    assert!(contains(&doc, b"(Shopping list) Tj"));
    assert!(contains(&doc, b"(flour - 500 g) Tj"));
}

#[test]
fn startxref_points_at_the_xref_table() {
    let doc = render_text_document("Title", &["a".to_string(), "b".to_string()]);
    let text = String::from_utf8_lossy(&doc);

    let offset: usize = text
        .rsplit("startxref\n")
        .next()
        .and_then(|tail| tail.lines().next())
        .and_then(|line| line.trim().parse().ok())
        .expect("startxref offset");
    assert!(doc[offset..].starts_with(b"xref\n"));
}

#[test]
fn long_listings_span_several_pages() {
    let lines: Vec<String> = (0..LINES_PER_PAGE * 2 + 1)
        .map(|i| format!("item {i} - 1 g"))
        .collect();
    let doc = render_text_document("Shopping list", &lines);

    assert!(contains(&doc, b"/Count 3"));
    assert_eq!(count(&doc, b"/Type /Page "), 3);
}

#[test]
fn empty_listing_still_renders_one_page() {
    let doc = render_text_document("Shopping list", &[]);
    assert!(contains(&doc, b"/Count 1"));
}

#[test]
fn delimiters_are_escaped_and_non_latin1_is_replaced() {
    assert_eq!(encode_text("salt (fine)"), b"salt \\(fine\\)".to_vec());
    assert_eq!(encode_text("a\\b"), b"a\\\\b".to_vec());
    assert_eq!(encode_text("café"), vec![b'c', b'a', b'f', 0xE9]);
    assert_eq!(encode_text("мука"), b"????".to_vec());
}
