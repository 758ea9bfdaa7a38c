//! Hand-rolled scanners for numbers and C-style literals.
//!
//! Each scanner looks at the remaining characters of a line and returns
//! how many of them form the literal, or `None`.

fn count_digits(text: &[char]) -> usize {
    text.iter().take_while(|c| c.is_ascii_digit()).count()
}

fn is_length_suffix(c: char) -> bool {
    matches!(c, 'l' | 'L' | 'u' | 'U')
}

/// One or more decimal digits.
pub(crate) fn scan_int(text: &[char]) -> Option<usize> {
    match count_digits(text) {
        0 => None,
        n => Some(n),
    }
}

/// `digits [. digits] [e|E [+|-] digits]`.
///
/// Needs at least one digit, and either a point or an exponent. An
/// exponent without digits fails the whole match.
pub(crate) fn scan_float(text: &[char]) -> Option<usize> {
    let mut len = 0;
    let mut have_digit = false;
    let mut have_point = false;

    let digits = count_digits(text);
    if digits > 0 {
        have_digit = true;
        len += digits;
    }
    if text.get(len) == Some(&'.') {
        have_point = true;
        len += 1;
    }
    let digits = count_digits(&text[len..]);
    if digits > 0 {
        have_digit = true;
        len += digits;
    }
    if !have_digit {
        return None;
    }

    if matches!(text.get(len), Some('e' | 'E')) {
        len += 1;
        if matches!(text.get(len), Some('+' | '-')) {
            len += 1;
        }
        let exponent = count_digits(&text[len..]);
        if exponent == 0 {
            return None;
        }
        return Some(len + exponent);
    }

    have_point.then_some(len)
}

/// `0` followed by octal digits, with an optional length suffix.
pub(crate) fn scan_c_oct(text: &[char]) -> Option<usize> {
    if text.first() != Some(&'0') {
        return None;
    }
    let mut len = 1 + text[1..].iter().take_while(|c| ('0'..='7').contains(*c)).count();
    if len == 1 {
        return None;
    }
    if text.get(len).copied().is_some_and(is_length_suffix) {
        len += 1;
    }
    Some(len)
}

/// `0x` followed by hex digits, with an optional length suffix.
pub(crate) fn scan_c_hex(text: &[char]) -> Option<usize> {
    if text.len() < 3 || text[0] != '0' || !matches!(text[1], 'x' | 'X') {
        return None;
    }
    let mut len = 2 + text[2..].iter().take_while(|c| c.is_ascii_hexdigit()).count();
    if len == 2 {
        return None;
    }
    if text.get(len).copied().is_some_and(is_length_suffix) {
        len += 1;
    }
    Some(len)
}

/// A backslash escape: `\n`, `\x1f`, `\017`, ...
pub(crate) fn scan_c_escape(text: &[char]) -> Option<usize> {
    if text.len() < 2 || text[0] != '\\' {
        return None;
    }
    let c = text[1];
    if "abefnrtv'\"?\\".contains(c) {
        return Some(2);
    }
    if c == 'x' {
        let digits = text[2..].iter().take_while(|c| c.is_ascii_hexdigit()).count();
        return (digits > 0).then_some(2 + digits);
    }
    if ('0'..='7').contains(&c) {
        let digits = text[1..].iter().take(3).take_while(|c| ('0'..='7').contains(*c)).count();
        return Some(1 + digits);
    }
    None
}

/// `'x'` or `'\n'`. The closing quote is mandatory.
pub(crate) fn scan_c_char(text: &[char]) -> Option<usize> {
    if text.len() < 3 || text[0] != '\'' || text[1] == '\'' {
        return None;
    }
    let body = scan_c_escape(&text[1..]).unwrap_or(1);
    let close = 1 + body;
    (text.get(close) == Some(&'\'')).then_some(close + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_int() {
        assert_eq!(scan_int(&chars("1234abc")), Some(4));
        assert_eq!(scan_int(&chars("x1")), None);
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(scan_float(&chars("3.14e-2f")), Some(7));
        assert_eq!(scan_float(&chars("3.14")), Some(4));
        assert_eq!(scan_float(&chars(".5")), Some(2));
        assert_eq!(scan_float(&chars("5.")), Some(2));
        assert_eq!(scan_float(&chars("1e10")), Some(4));
    }

    #[test]
    fn test_float_rejects() {
        assert_eq!(scan_float(&chars("42")), None);
        assert_eq!(scan_float(&chars(".")), None);
        assert_eq!(scan_float(&chars("1e")), None);
        assert_eq!(scan_float(&chars("1.5e+")), None);
    }

    #[test]
    fn test_c_oct() {
        assert_eq!(scan_c_oct(&chars("0755")), Some(4));
        assert_eq!(scan_c_oct(&chars("017L;")), Some(4));
        assert_eq!(scan_c_oct(&chars("0")), None);
        assert_eq!(scan_c_oct(&chars("08")), None);
    }

    #[test]
    fn test_c_hex() {
        assert_eq!(scan_c_hex(&chars("0xFFu")), Some(5));
        assert_eq!(scan_c_hex(&chars("0X1a2b")), Some(6));
        assert_eq!(scan_c_hex(&chars("0x")), None);
        assert_eq!(scan_c_hex(&chars("0xg")), None);
    }

    #[test]
    fn test_c_escape() {
        assert_eq!(scan_c_escape(&chars("\\n")), Some(2));
        assert_eq!(scan_c_escape(&chars("\\x1fz")), Some(4));
        assert_eq!(scan_c_escape(&chars("\\0177")), Some(4));
        assert_eq!(scan_c_escape(&chars("\\x")), None);
        assert_eq!(scan_c_escape(&chars("\\q")), None);
    }

    #[test]
    fn test_c_char() {
        assert_eq!(scan_c_char(&chars("'a'")), Some(3));
        assert_eq!(scan_c_char(&chars("'\\n' x")), Some(4));
        assert_eq!(scan_c_char(&chars("'\\x41'")), Some(6));
        assert_eq!(scan_c_char(&chars("'ab'")), None);
        assert_eq!(scan_c_char(&chars("''")), None);
    }
}
