//! Name normalization for nodes in the generated tree.
//!
//! Directory names in the source tree are written in whatever style the author
//! prefers (`game_data`, `shop-ui`, `Inventory`). The generated tree uses a
//! single canonical style: words joined with their first letter upper-cased.
//!
//! ## Rules
//!
//! - `"my_cool-thing"` → `"MyCoolThing"` (split on non-alphanumerics, capitalize each word)
//! - `"ui"` → `"Ui"`
//! - `"UI"` → `"UI"` (all-caps names are intentional acronyms and pass through)
//! - `"camelCase"` → `"CamelCase"` (only the first letter of a word changes)
//!
//! Normalization is idempotent: a normalized name normalizes to itself.
//!
//! Module *file* names are not normalized. A file stem usually is the exported
//! identifier already, so it is kept verbatim (see [`crate::classify::strip_extension`]).

/// Map a raw file or directory name to its canonical node name.
pub fn normalize(raw: &str) -> String {
    if is_acronym(raw) {
        return raw.to_string();
    }
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect()
}

/// True for names made only of `A-Z`, `0-9` and `_`.
fn is_acronym(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Place names end up in file names and CLI arguments, so they are restricted
/// to ASCII letters, digits, dashes and underscores.
pub fn is_valid_place_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
