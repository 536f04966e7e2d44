/// Normalize a raw selector into a lookup key relative to the served root.
/// Empty and "/" both name the root; anything else has its leading and
/// trailing slashes stripped.
pub fn normalize(selector: &str) -> &str {
    if selector.is_empty() || selector == "/" {
        "."
    } else {
        selector.trim_matches('/')
    }
}
