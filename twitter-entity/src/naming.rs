/// Normalize an attribute name written in camelCase or snake_case to the snake_case keys used by
/// the Twitter API.
///
/// An underscore is inserted between a lowercase letter and the uppercase letter following it,
/// unless that uppercase letter starts a run of capitals (`userIDs` is left alone so acronyms
/// survive). The uppercase letter is lowercased and, finally, so is the first character.
/// Everything else is kept as is.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        let current = chars[i];
        let starts_word = current.is_ascii_lowercase()
            && chars.get(i + 1).map_or(false, char::is_ascii_uppercase)
            && !chars.get(i + 2).map_or(false, char::is_ascii_uppercase);

        if starts_word {
            out.push(current);
            out.push('_');
            out.push(chars[i + 1].to_ascii_lowercase());
            i += 2;
        } else {
            out.push(current);
            i += 1;
        }
    }

    lower_first(&out)
}

/// Turn an accessor-style method name (`getCreatedAt`) into the attribute it reads (`CreatedAt`).
pub fn accessor_attribute(method: &str) -> &str {
    method.strip_prefix("get").unwrap_or(method)
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
