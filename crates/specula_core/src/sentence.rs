//! Render identifiers as sentences for reports.
//!
//! `EmptyStack` → `Empty stack`, `is_empty` → `is empty`, `holds2Items` → `holds 2 items`.

/// Split an identifier into lowercase words, keeping the first character as written.
pub fn from_identifier(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut out = String::with_capacity(ident.len() + 8);
    let mut in_number = false;

    for (pos, ch) in ident.chars().enumerate() {
        if ch == '_' {
            out.push(' ');
            in_number = false;
        } else if ch.is_ascii_digit() {
            if !in_number {
                out.push(' ');
            }
            out.push(ch);
            in_number = true;
        } else {
            if (pos > 0 && ch.is_uppercase()) || in_number {
                out.push(' ');
            }
            if pos > 0 {
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
            in_number = false;
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
