use crate::error::ProtoError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref HEX_RX:   Regex = Regex::new(r"^-?0[xX][0-9A-Fa-f]+$").unwrap();
    static ref INT_RX:   Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref FLOAT_RX: Regex = Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap();
}

/// The reserved words of the schema grammar. Anything else that scans as an
/// identifier becomes a bareword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Keyword {
    Import,
    Package,
    Option,
    Message,
    Group,
    Enum,
    Extend,
    Service,
    Rpc,
    Required,
    Optional,
    Repeated,
    Returns,
    Extensions,
    Max,
    To,
    True,
    False,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        match word {
            "import" => Some(Keyword::Import),
            "package" => Some(Keyword::Package),
            "option" => Some(Keyword::Option),
            "message" => Some(Keyword::Message),
            "group" => Some(Keyword::Group),
            "enum" => Some(Keyword::Enum),
            "extend" => Some(Keyword::Extend),
            "service" => Some(Keyword::Service),
            "rpc" => Some(Keyword::Rpc),
            "required" => Some(Keyword::Required),
            "optional" => Some(Keyword::Optional),
            "repeated" => Some(Keyword::Repeated),
            "returns" => Some(Keyword::Returns),
            "extensions" => Some(Keyword::Extensions),
            "max" => Some(Keyword::Max),
            "to" => Some(Keyword::To),
            "true" => Some(Keyword::True),
            "false" => Some(Keyword::False),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    Punct(char),
    Keyword(Keyword),
    Bareword(String),
    Integer(i64),
    Float(f64),
    StrLit(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize) -> Token {
        Token { kind, line }
    }
}

const PUNCTUATION: &[char] = &['{', '}', '[', ']', '(', ')', '=', ';', ','];

/// Scans schema text into a flat token sequence terminated by an explicit
/// end-of-input token. Never fails on well-formed ASCII input; any byte it
/// cannot classify is an `InvalidCharacter` error carrying the offending
/// character and line.
pub fn scan(text: &str) -> Result<Vec<Token>, ProtoError> {
    let src: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < src.len() {
        let c = src[i];

        if c == '\n' {
            line += 1;
            i += 1;
        } else if c == ' ' || c == '\t' || c == '\r' {
            i += 1;
        } else if c == '/' && src.get(i + 1) == Some(&'/') {
            while i < src.len() && src[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && src.get(i + 1) == Some(&'*') {
            let start_line = line;
            i += 2;
            loop {
                if i >= src.len() {
                    return Err(ProtoError::UnterminatedComment { line: start_line });
                }
                if src[i] == '*' && src.get(i + 1) == Some(&'/') {
                    i += 2;
                    break;
                }
                if src[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }
        } else if PUNCTUATION.contains(&c) {
            tokens.push(Token::new(TokenKind::Punct(c), line));
            i += 1;
        } else if c == '"' {
            let (value, next, next_line) = scan_string(&src, i, line)?;
            tokens.push(Token::new(TokenKind::StrLit(value), line));
            i = next;
            line = next_line;
        } else if c.is_ascii_digit() || (c == '-' && matches!(src.get(i + 1), Some(d) if d.is_ascii_digit())) {
            let (kind, next) = scan_number(&src, i, line)?;
            tokens.push(Token::new(kind, line));
            i = next;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while i < src.len() && (src[i].is_ascii_alphanumeric() || src[i] == '_' || src[i] == '.') {
                word.push(src[i]);
                i += 1;
            }
            let kind = match Keyword::from_word(&word) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Bareword(word),
            };
            tokens.push(Token::new(kind, line));
        } else {
            return Err(ProtoError::InvalidCharacter { ch: c, line });
        }
    }

    tokens.push(Token::new(TokenKind::Eof, line));
    Ok(tokens)
}

fn scan_number(src: &[char], start: usize, line: usize) -> Result<(TokenKind, usize), ProtoError> {
    let mut i = start;
    let mut text = String::new();

    if src[i] == '-' {
        text.push('-');
        i += 1;
    }
    while i < src.len() {
        let c = src[i];
        if c.is_ascii_alphanumeric() || c == '.' {
            text.push(c);
            i += 1;
        } else if (c == '+' || c == '-') && matches!(text.chars().last(), Some('e') | Some('E')) {
            text.push(c);
            i += 1;
        } else {
            break;
        }
    }

    let invalid = || ProtoError::InvalidNumber {
        text: text.clone(),
        line,
    };

    if HEX_RX.is_match(&text) {
        let negative = text.starts_with('-');
        let digits = text.trim_start_matches('-');
        let digits = &digits[2..];
        let value = i64::from_str_radix(digits, 16).map_err(|_| invalid())?;
        Ok((TokenKind::Integer(if negative { -value } else { value }), i))
    } else if INT_RX.is_match(&text) {
        let value = text.parse::<i64>().map_err(|_| invalid())?;
        Ok((TokenKind::Integer(value), i))
    } else if FLOAT_RX.is_match(&text) {
        let value = text.parse::<f64>().map_err(|_| invalid())?;
        Ok((TokenKind::Float(value), i))
    } else {
        Err(invalid())
    }
}

fn scan_string(
    src: &[char],
    start: usize,
    start_line: usize,
) -> Result<(String, usize, usize), ProtoError> {
    let mut i = start + 1;
    let mut line = start_line;
    let mut value = String::new();

    loop {
        if i >= src.len() {
            return Err(ProtoError::UnterminatedString { line: start_line });
        }
        let c = src[i];
        match c {
            '"' => return Ok((value, i + 1, line)),
            '\n' => {
                line += 1;
                value.push('\n');
                i += 1;
            }
            '\\' => {
                i += 1;
                if i >= src.len() {
                    return Err(ProtoError::UnterminatedString { line: start_line });
                }
                let escape = src[i];
                i += 1;
                match escape {
                    'a' => value.push('\u{07}'),
                    'e' => value.push('\u{1B}'),
                    'f' => value.push('\u{0C}'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'v' => value.push('\u{0B}'),
                    'x' => {
                        let hex: String = src[i..]
                            .iter()
                            .take(2)
                            .take_while(|c| c.is_ascii_hexdigit())
                            .collect();
                        if hex.len() == 2 {
                            i += 2;
                            let byte = u8::from_str_radix(&hex, 16).unwrap_or(0);
                            value.push(byte as char);
                        } else {
                            value.push('x');
                        }
                    }
                    '0'..='7' => {
                        let mut octal = String::new();
                        octal.push(escape);
                        while octal.len() < 3
                            && matches!(src.get(i), Some(d) if ('0'..='7').contains(d))
                        {
                            octal.push(src[i]);
                            i += 1;
                        }
                        let byte = u32::from_str_radix(&octal, 8).unwrap_or(0);
                        value.push((byte & 0xFF) as u8 as char);
                    }
                    other => {
                        // any other escaped character passes through literally
                        if other == '\n' {
                            line += 1;
                        }
                        value.push(other);
                    }
                }
            }
            _ => {
                value.push(c);
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        scan(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scan_simple_field() {
        assert_eq!(
            kinds("required int32 age = 2;"),
            vec![
                TokenKind::Keyword(Keyword::Required),
                TokenKind::Bareword("int32".to_string()),
                TokenKind::Bareword("age".to_string()),
                TokenKind::Punct('='),
                TokenKind::Integer(2),
                TokenKind::Punct(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scan_keywords_and_barewords() {
        assert_eq!(
            kinds("message Person extensions max to foo.bar.Baz"),
            vec![
                TokenKind::Keyword(Keyword::Message),
                TokenKind::Bareword("Person".to_string()),
                TokenKind::Keyword(Keyword::Extensions),
                TokenKind::Keyword(Keyword::Max),
                TokenKind::Keyword(Keyword::To),
                TokenKind::Bareword("foo.bar.Baz".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scan_numbers() {
        assert_eq!(
            kinds("1 -2 0x1F -0x10 1.5 -2.25 3e2 1.5e-3"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Integer(-2),
                TokenKind::Integer(31),
                TokenKind::Integer(-16),
                TokenKind::Float(1.5),
                TokenKind::Float(-2.25),
                TokenKind::Float(300.0),
                TokenKind::Float(0.0015),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scan_counts_lines_through_comments() {
        let text = "message A {\n// comment line\n/* block\nspans\nlines */\n}\n";
        let tokens = scan(text).unwrap();
        assert_eq!(tokens[0].line, 1); // message
        assert_eq!(tokens[2].line, 1); // {
        assert_eq!(tokens[3].line, 6); // }
        assert_eq!(tokens[4].line, 7); // end of input
    }

    #[test]
    fn scan_string_escapes() {
        assert_eq!(
            kinds(r#""plain" "a\tb" "\x41\101" "q\qz""#),
            vec![
                TokenKind::StrLit("plain".to_string()),
                TokenKind::StrLit("a\tb".to_string()),
                TokenKind::StrLit("AA".to_string()),
                TokenKind::StrLit("qqz".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scan_string_counts_embedded_newlines() {
        let tokens = scan("\"one\ntwo\" x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StrLit("one\ntwo".to_string()));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Bareword("x".to_string()));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn scan_rejects_unknown_characters() {
        let err = scan("message @").unwrap_err();
        assert!(
            matches!(err, ProtoError::InvalidCharacter { ch: '@', line: 1 }),
            "expected InvalidCharacter but got {:?}",
            err
        );
        let err = scan("a\nb\n#").unwrap_err();
        assert!(matches!(err, ProtoError::InvalidCharacter { ch: '#', line: 3 }));
    }

    #[test]
    fn scan_rejects_malformed_numbers() {
        assert!(matches!(
            scan("0x").unwrap_err(),
            ProtoError::InvalidNumber { .. }
        ));
        assert!(matches!(
            scan("12ab").unwrap_err(),
            ProtoError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn scan_rejects_unterminated_constructs() {
        assert!(matches!(
            scan("\"open").unwrap_err(),
            ProtoError::UnterminatedString { line: 1 }
        ));
        assert!(matches!(
            scan("/* open").unwrap_err(),
            ProtoError::UnterminatedComment { line: 1 }
        ));
    }

    #[test]
    fn scan_ends_with_eof_token() {
        let tokens = scan("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].line, 1);
    }
}
