/// Title-case a name the way Python's `str.title` does: every run of letters
/// starts upper-case and continues lower-case.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_is_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}

/// Trim and title-case a city name.
pub fn normalize_city(raw: &str) -> String {
    title_case(raw.trim())
}
