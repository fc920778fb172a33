use foodgram::routes::params::{MAX_PER_PAGE, Pagination, RecipeQuery, parse_flag};

#[test]
fn pagination_defaults_and_offset() {
    assert_eq!(Pagination::default().normalize(10), (1, 10, 0));
    assert_eq!(Pagination::new(Some(3), Some(20)).normalize(10), (3, 20, 40));
}

#[test]
fn pagination_is_clamped() {
    assert_eq!(Pagination::new(Some(0), Some(0)).normalize(10), (1, 1, 0));
    assert_eq!(
        Pagination::new(Some(1), Some(10_000)).normalize(10),
        (1, MAX_PER_PAGE, 0)
    );
}

#[test]
fn huge_page_number_saturates_offset() {
    let (page, per_page, offset) = Pagination::new(Some(i64::MAX), Some(100)).normalize(10);
    assert_eq!((page, per_page), (i64::MAX, 100));
    assert_eq!(offset, i64::MAX);
}

#[test]
fn query_pagination_carries_page_and_size() {
    let query = RecipeQuery {
        page: Some(2),
        per_page: Some(5),
        ..Default::default()
    };
    assert_eq!(query.pagination().normalize(10), (2, 5, 5));
}

#[test]
fn flags_accept_words_and_digits() {
    assert_eq!(parse_flag(Some("true")), Some(true));
    assert_eq!(parse_flag(Some("1")), Some(true));
    assert_eq!(parse_flag(Some("False")), Some(false));
    assert_eq!(parse_flag(Some("0")), Some(false));
    assert_eq!(parse_flag(Some("maybe")), None);
    assert_eq!(parse_flag(None), None);
}

#[test]
fn tag_slugs_are_split_on_commas() {
    let query = RecipeQuery {
        tags: Some("breakfast, dinner,,lunch ".into()),
        ..Default::default()
    };
    assert_eq!(query.tag_slugs(), vec!["breakfast", "dinner", "lunch"]);
    assert!(RecipeQuery::default().tag_slugs().is_empty());
}
