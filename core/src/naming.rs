//! Identifier sanitizing and column-name de-duplication.

use crate::types::Column;

/// Prefix used for result columns that come back without a name.
const UNNAMED_COLUMN_PREFIX: &str = "Column";

/// Turns an arbitrary string into a valid identifier.
///
/// A leading digit gets an underscore in front of it, and every character
/// that is neither a letter nor a digit becomes an underscore.
///
/// # Examples
///
/// ```
/// use entity_schema_core::make_safe_name;
///
/// assert_eq!(make_safe_name("1abc def"), "_1abc_def");
/// assert_eq!(make_safe_name("Ok_Name1"), "Ok_Name1");
/// assert_eq!(make_safe_name("order-total($)"), "order_total___");
/// assert_eq!(make_safe_name(""), "");
/// ```
pub fn make_safe_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    if raw.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.push('_');
    }
    out.extend(raw.chars().map(|c| if is_word_char(c) { c } else { '_' }));
    out
}

/// Letters and decimal digits. Numeric letters such as `Ⅻ` and other number
/// forms such as `²` are neither.
fn is_word_char(c: char) -> bool {
    c.is_ascii_digit() || (c.is_alphabetic() && !c.is_numeric())
}

/// Makes every name in the list unique, left to right.
///
/// Empty names become `Column{N}` with the smallest `N` not already in the
/// list. A name that repeats an earlier one gets the smallest numeric suffix
/// that is unique across the whole list. Earlier entries are never touched
/// by later collisions.
///
/// # Examples
///
/// ```
/// use entity_schema_core::deduplicate_names;
///
/// let mut names: Vec<String> = ["", "", "Id", "Id"].iter().map(|s| s.to_string()).collect();
/// deduplicate_names(&mut names);
/// assert_eq!(names, ["Column1", "Column2", "Id", "Id1"]);
/// ```
pub fn deduplicate_names(names: &mut [String]) {
    for i in 0..names.len() {
        if names[i].is_empty() {
            let mut n = 1usize;
            loop {
                let candidate = format!("{UNNAMED_COLUMN_PREFIX}{n}");
                if !names.contains(&candidate) {
                    names[i] = candidate;
                    break;
                }
                n += 1;
            }
        } else if names[..i].contains(&names[i]) {
            let base = names[i].clone();
            let mut seq = 1usize;
            loop {
                let candidate = format!("{base}{seq}");
                let taken = names
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && *other == candidate);
                if !taken {
                    names[i] = candidate;
                    break;
                }
                seq += 1;
            }
        }
    }
}

/// Applies [`deduplicate_names`] to the names of a column list.
pub fn deduplicate_columns(columns: &mut [Column]) {
    let mut names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    deduplicate_names(&mut names);
    for (column, name) in columns.iter_mut().zip(names) {
        column.name = name;
    }
}
