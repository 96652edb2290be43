//! ECMA-262 pattern translation.
//!
//! JSON Schema specifies ECMA-262 regular expression semantics for `pattern`
//! and friends. The host engines are close but not identical, so the ECMA
//! dialect rewrites the differing constructs before compilation:
//!
//! - `\d \D \w \W \s \S` outside character classes become explicit ASCII (or
//!   ECMA whitespace) classes,
//! - long Unicode property names are rewritten to the short general-category
//!   form,
//! - an unescaped `$` becomes the end-of-text anchor `\z`,
//! - `\uFFFF` escapes become `\x{FFFF}`,
//! - `\cX` control letters are uppercased,
//! - escapes that ECMA-262 rejects (e.g. `\a`) are errors.

use crate::error::SchemaError;

/// The ECMA-262 `\s` set, as a character-class body.
const ECMA_WHITESPACE: &str = r" \t\n\x0B\x0C\r\x{00A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

fn invalid(pattern: &str, message: impl Into<String>) -> SchemaError {
    SchemaError::InvalidEcmaRegexp {
        pattern: pattern.to_string(),
        message: message.into(),
    }
}

/// Rewrite `pattern` so the host engines implement ECMA-262 semantics.
pub(crate) fn translate(pattern: &str) -> Result<String, SchemaError> {
    let mut output = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(current) = chars.next() {
        match current {
            '\\' => {
                let Some(&escaped) = chars.peek() else {
                    return Err(invalid(pattern, "trailing backslash"));
                };
                chars.next();
                translate_escape(pattern, escaped, &mut chars, in_class, &mut output)?;
            }
            '[' if !in_class => {
                in_class = true;
                output.push('[');
            }
            ']' if in_class => {
                in_class = false;
                output.push(']');
            }
            '$' if !in_class => output.push_str(r"\z"),
            other => output.push(other),
        }
    }
    Ok(output)
}

fn translate_escape(
    pattern: &str,
    escaped: char,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    in_class: bool,
    output: &mut String,
) -> Result<(), SchemaError> {
    match escaped {
        'd' if !in_class => output.push_str("[0-9]"),
        'D' if !in_class => output.push_str("[^0-9]"),
        'w' if !in_class => output.push_str("[A-Za-z0-9_]"),
        'W' if !in_class => output.push_str("[^A-Za-z0-9_]"),
        's' if !in_class => {
            output.push('[');
            output.push_str(ECMA_WHITESPACE);
            output.push(']');
        }
        'S' if !in_class => {
            output.push_str("[^");
            output.push_str(ECMA_WHITESPACE);
            output.push(']');
        }
        'p' | 'P' => {
            if chars.peek() != Some(&'{') {
                return Err(invalid(pattern, format!("`\\{escaped}` without a property name")));
            }
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(part) => name.push(part),
                    None => return Err(invalid(pattern, "unterminated unicode property")),
                }
            }
            output.push('\\');
            output.push(escaped);
            output.push('{');
            output.push_str(&short_property_name(&name));
            output.push('}');
        }
        'c' => {
            let Some(&letter) = chars.peek() else {
                return Err(invalid(pattern, "`\\c` without a control letter"));
            };
            if !letter.is_ascii_alphabetic() {
                return Err(invalid(pattern, "`\\c` without a control letter"));
            }
            chars.next();
            output.push_str("\\c");
            output.push(letter.to_ascii_uppercase());
        }
        'u' => {
            // `\uFFFF` and `\u{…}` become `\x{…}`.
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(digit) if digit.is_ascii_hexdigit() => digits.push(digit),
                        _ => return Err(invalid(pattern, "malformed `\\u` escape")),
                    }
                }
                output.push_str("\\x{");
                output.push_str(&digits);
                output.push('}');
            } else {
                let mut digits = String::new();
                for _ in 0..4 {
                    match chars.next() {
                        Some(digit) if digit.is_ascii_hexdigit() => digits.push(digit),
                        _ => return Err(invalid(pattern, "malformed `\\u` escape")),
                    }
                }
                output.push_str("\\x{");
                output.push_str(&digits);
                output.push('}');
            }
        }
        // Escapes ECMA-262 shares with the host engines.
        'b' | 'B' | 'f' | 'k' | 'n' | 'r' | 't' | 'v' | 'x' | '0'..='9' => {
            output.push('\\');
            output.push(escaped);
        }
        // In-class shorthand classes are understood by the hosts as-is.
        'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
            output.push('\\');
            output.push(escaped);
        }
        other if other.is_ascii_alphabetic() => {
            return Err(invalid(pattern, format!("`\\{other}` is not a valid escape")));
        }
        other => {
            output.push('\\');
            output.push(other);
        }
    }
    Ok(())
}

/// Map long Unicode general-category names to the short form the host engines
/// prefer. Case-insensitive; dashes and spaces normalize to underscores.
fn short_property_name(name: &str) -> std::borrow::Cow<'static, str> {
    let normalized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    let short = match normalized.as_str() {
        "letter" | "l" => "L",
        "lowercase_letter" | "ll" => "Ll",
        "uppercase_letter" | "lu" => "Lu",
        "titlecase_letter" | "lt" => "Lt",
        "modifier_letter" | "lm" => "Lm",
        "other_letter" | "lo" => "Lo",
        "mark" | "m" => "M",
        "nonspacing_mark" | "mn" => "Mn",
        "spacing_mark" | "mc" => "Mc",
        "enclosing_mark" | "me" => "Me",
        "number" | "n" => "N",
        "digit" | "decimal_number" | "nd" => "Nd",
        "letter_number" | "nl" => "Nl",
        "other_number" | "no" => "No",
        "punctuation" | "p" => "P",
        "connector_punctuation" | "pc" => "Pc",
        "dash_punctuation" | "pd" => "Pd",
        "open_punctuation" | "ps" => "Ps",
        "close_punctuation" | "pe" => "Pe",
        "initial_punctuation" | "pi" => "Pi",
        "final_punctuation" | "pf" => "Pf",
        "other_punctuation" | "po" => "Po",
        "symbol" | "s" => "S",
        "math_symbol" | "sm" => "Sm",
        "currency_symbol" | "sc" => "Sc",
        "modifier_symbol" | "sk" => "Sk",
        "other_symbol" | "so" => "So",
        "separator" | "z" => "Z",
        "space_separator" | "zs" => "Zs",
        "line_separator" | "zl" => "Zl",
        "paragraph_separator" | "zp" => "Zp",
        "other" | "c" => "C",
        "control" | "cc" => "Cc",
        "format" | "cf" => "Cf",
        "surrogate" | "cs" => "Cs",
        "private_use" | "co" => "Co",
        "unassigned" | "cn" => "Cn",
        // Unknown names pass through untouched and fail host compilation.
        other => return std::borrow::Cow::Owned(other.to_string()),
    };
    std::borrow::Cow::Borrowed(short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r"a\d+", "a[0-9]+")]
    #[test_case(r"[\d]", r"[\d]"; "shorthand kept inside classes")]
    #[test_case(r"\w-\W", "[A-Za-z0-9_]-[^A-Za-z0-9_]")]
    #[test_case(r"a$", r"a\z")]
    #[test_case(r"[$]", "[$]"; "dollar kept inside classes")]
    #[test_case(r"a\$", r"a\$"; "escaped dollar kept")]
    #[test_case(r"\cj", r"\cJ")]
    #[test_case(r"\u0041", r"\x{0041}")]
    #[test_case(r"\u{1F600}", r"\x{1F600}")]
    #[test_case(r"\p{letter}", r"\p{L}")]
    #[test_case(r"\p{Lowercase-Letter}", r"\p{Ll}")]
    #[test_case(r"\P{space separator}", r"\P{Zs}")]
    fn translations(pattern: &str, expected: &str) {
        assert_eq!(translate(pattern).expect("translates"), expected);
    }

    #[test_case(r"\a")]
    #[test_case(r"\q")]
    #[test_case(r"\c1")]
    #[test_case(r"trailing\")]
    #[test_case(r"\p{unterminated")]
    fn rejected(pattern: &str) {
        assert!(matches!(
            translate(pattern).expect_err("invalid under ECMA-262"),
            SchemaError::InvalidEcmaRegexp { .. }
        ));
    }

    #[test]
    fn whitespace_class_matches_ecma_set() {
        let translated = translate(r"^\s$").expect("translates");
        let re = regex::Regex::new(&translated).expect("compiles");
        for ws in ['\t', '\n', ' ', '\u{00A0}', '\u{2003}', '\u{FEFF}'] {
            assert!(re.is_match(&ws.to_string()), "{ws:?} should match");
        }
        assert!(!re.is_match("x"));
    }
}
