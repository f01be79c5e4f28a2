//! Recognizing records created by seeding and API test runs
//!
//! Seeded records carry a fixed prefix in their business code (by default
//! `APITEST_`) so they can be found and removed again without touching real
//! data.

/// Whether `code` starts with `prefix`, ignoring ASCII case
///
/// An empty prefix matches nothing.
#[must_use]
pub fn is_test_data(prefix: &str, code: &str) -> bool {
    !prefix.is_empty()
        && code
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Keep the items whose code (as picked by `code_of`) is test data
pub fn filter_test_data<T>(
    items: Vec<T>,
    prefix: &str,
    code_of: impl Fn(&T) -> Option<&str>,
) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| code_of(item).is_some_and(|code| is_test_data(prefix, code)))
        .collect()
}
