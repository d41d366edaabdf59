//! Element name validation for class and field keywords

/// True if `name` can be written as a class or field keyword.
///
/// Names must be non-empty, must not start with a digit or `.`, must not
/// start with `xml` in any letter case and must not contain a space.
pub fn is_valid_element_name(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    if first.is_ascii_digit() || first == '.' {
        return false;
    }
    if name.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml")) {
        return false;
    }
    !name.contains(' ')
}
