const ESCAPE_CHAR: char = '\\';

const SPECIAL_CHARS: [char; 18] = [
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
];

fn is_special(ch: char) -> bool {
    SPECIAL_CHARS.contains(&ch)
}

/// Prefixes every query-syntax character with a backslash. Single pass:
/// escaping already escaped text escapes it again.
pub fn escape_phrase(phrase: &str) -> String {
    let mut escaped = String::with_capacity(phrase.len());
    for ch in phrase.chars() {
        if is_special(ch) {
            escaped.push(ESCAPE_CHAR);
        }
        escaped.push(ch);
    }
    escaped
}
