//! Identifier case conversion shared by the emitters and the scaffolder.

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Split an identifier into words on `-`, `_`, `.`, spaces and lower-to-upper
/// case boundaries. `myHTTPClient` splits as `my`, `HTTP`, `Client`.
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '-' | '_' | '.' | ' ' | '@' | '/') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `craby-test` -> `CrabyTest`, `my_module` -> `MyModule`.
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|word| capitalize_first(&word.to_ascii_lowercase()))
        .collect()
}

/// `CrabyTest` -> `craby_test`, `myHTTPClient` -> `my_http_client`.
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}
