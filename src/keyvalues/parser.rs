//! Tokenizer and recursive parser for the KeyValues text format.
//!
//! KeyValues (also called VDF) is the nested key-value text format Steam
//! uses for `libraryfolders.vdf`, `appmanifest_*.acf` and most other client
//! metadata. A document is a sequence of `key value` pairs and `key { ... }`
//! containers at arbitrary nesting depth:
//!
//! ```text
//! "libraryfolders"
//! {
//!     "0"
//!     {
//!         "path"      "/home/user/.local/share/Steam"
//!     }
//! }
//! ```
//!
//! Parsing is all-or-nothing: malformed input yields a [`ParseError`] with
//! the 1-based line and column of the offending token and no partial tree.

use thiserror::Error;

use super::document::{Document, Node};

/// What went wrong while parsing KeyValues text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("expected a value or '{{' after key")]
    MissingValue,

    #[error("'{{' without a preceding key")]
    OpenWithoutKey,

    #[error("'}}' without a matching '{{'")]
    UnmatchedClose,

    #[error("unclosed container at end of input")]
    UnclosedContainer,
}

/// Parse failure, positioned at the start of the offending token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn new(kind: ParseErrorKind, pos: Pos) -> Self {
        Self {
            kind,
            line: pos.line,
            column: pos.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pos {
    line: usize,
    column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Str(String),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Spanned {
    token: Token,
    pos: Pos,
}

/// Parse KeyValues text into a document tree.
///
/// The returned document's root is an unnamed container holding the
/// top-level entries; see [`Document::top`] for the usual consumer view.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let tokens = tokenize(text)?;
    let mut index = 0;
    let children = parse_children(&tokens, &mut index, None)?;
    Ok(Document::new(Node::container("", children)))
}

struct Scanner {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

fn tokenize(text: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut scanner = Scanner::new(text);
    let mut tokens = Vec::new();

    while let Some(c) = scanner.peek() {
        if c.is_whitespace() {
            scanner.bump();
            continue;
        }

        // Line comments run to end of line and are discarded
        if c == '/' && scanner.peek_next() == Some('/') {
            while let Some(c) = scanner.peek() {
                if c == '\n' {
                    break;
                }
                scanner.bump();
            }
            continue;
        }

        let pos = scanner.pos();
        match c {
            '{' => {
                scanner.bump();
                tokens.push(Spanned {
                    token: Token::Open,
                    pos,
                });
            }
            '}' => {
                scanner.bump();
                tokens.push(Spanned {
                    token: Token::Close,
                    pos,
                });
            }
            '"' => {
                let value = read_quoted(&mut scanner, pos)?;
                tokens.push(Spanned {
                    token: Token::Str(value),
                    pos,
                });
            }
            _ => {
                let value = read_unquoted(&mut scanner);
                tokens.push(Spanned {
                    token: Token::Str(value),
                    pos,
                });
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted string, `scanner` positioned on the opening quote.
///
/// Recognizes `\"`, `\\`, `\n` and `\t`; any other escape sequence passes
/// through verbatim. Raw newlines inside the quotes are part of the value.
fn read_quoted(scanner: &mut Scanner, start: Pos) -> Result<String, ParseError> {
    scanner.bump();

    let mut value = String::new();
    loop {
        let Some(c) = scanner.bump() else {
            return Err(ParseError::new(ParseErrorKind::UnterminatedString, start));
        };
        match c {
            '"' => return Ok(value),
            '\\' => match scanner.bump() {
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => {
                    return Err(ParseError::new(ParseErrorKind::UnterminatedString, start));
                }
            },
            _ => value.push(c),
        }
    }
}

/// Read an unquoted token: a maximal run of characters up to whitespace,
/// a brace, a quote or the start of a line comment.
fn read_unquoted(scanner: &mut Scanner) -> String {
    let mut value = String::new();
    while let Some(c) = scanner.peek() {
        if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
            break;
        }
        if c == '/' && scanner.peek_next() == Some('/') {
            break;
        }
        value.push(c);
        scanner.bump();
    }
    value
}

/// Parse the entries of one container.
///
/// `opened_at` is the position of the `{` this call is nested under, or
/// `None` at the top level; it decides whether a `}` closes the container
/// or is a stray, and where an unclosed-container error points.
fn parse_children(
    tokens: &[Spanned],
    index: &mut usize,
    opened_at: Option<Pos>,
) -> Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();

    loop {
        let Some(spanned) = tokens.get(*index) else {
            return match opened_at {
                Some(pos) => Err(ParseError::new(ParseErrorKind::UnclosedContainer, pos)),
                None => Ok(nodes),
            };
        };

        match &spanned.token {
            Token::Close => {
                if opened_at.is_none() {
                    return Err(ParseError::new(ParseErrorKind::UnmatchedClose, spanned.pos));
                }
                *index += 1;
                return Ok(nodes);
            }
            Token::Open => {
                return Err(ParseError::new(ParseErrorKind::OpenWithoutKey, spanned.pos));
            }
            Token::Str(key) => {
                let key_pos = spanned.pos;
                *index += 1;
                match tokens.get(*index) {
                    Some(Spanned {
                        token: Token::Str(value),
                        ..
                    }) => {
                        *index += 1;
                        nodes.push(Node::leaf(key.as_str(), value.as_str()));
                    }
                    Some(Spanned {
                        token: Token::Open,
                        pos,
                    }) => {
                        let open_pos = *pos;
                        *index += 1;
                        let children = parse_children(tokens, index, Some(open_pos))?;
                        nodes.push(Node::container(key.as_str(), children));
                    }
                    _ => {
                        // Close or end of input where a value was expected
                        return Err(ParseError::new(ParseErrorKind::MissingValue, key_pos));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_flat_pairs() {
        let doc = parse("\"key\" \"value\"\n\"other\" \"thing\"").unwrap();
        let root = doc.root();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.get_value("key"), Some("value"));
        assert_eq!(root.get_value("other"), Some("thing"));
    }

    #[test]
    fn test_parse_nested_containers() {
        let text = r#"
"AppState"
{
    "appid"      "42"
    "UserConfig"
    {
        "language"   "english"
    }
}
"#;
        let doc = parse(text).unwrap();
        let state = doc.top().unwrap();
        assert_eq!(state.name(), "AppState");
        assert_eq!(state.get_value("appid"), Some("42"));
        let user = state.get_child("UserConfig").unwrap();
        assert!(user.is_container());
        assert_eq!(user.get_value("language"), Some("english"));
    }

    #[test]
    fn test_duplicate_keys_kept_in_order() {
        let doc = parse("\"root\" { \"path\" \"/a\" \"path\" \"/b\" }").unwrap();
        let root = doc.top().unwrap();
        let values: Vec<&str> = root
            .children()
            .iter()
            .filter(|n| n.name() == "path")
            .filter_map(Node::value)
            .collect();
        assert_eq!(values, vec!["/a", "/b"]);
    }

    #[test]
    fn test_comments_are_discarded() {
        let text = "// header comment\n\"key\" \"value\" // trailing\n// \"ghost\" \"entry\"";
        let doc = parse(text).unwrap();
        assert_eq!(doc.root().children().len(), 1);
        assert_eq!(doc.root().get_value("key"), Some("value"));
    }

    #[test]
    fn test_escapes_in_quoted_strings() {
        let doc = parse(r#""path" "C:\\Program Files\\Steam" "quote" "say \"hi\"""#).unwrap();
        assert_eq!(
            doc.root().get_value("path"),
            Some(r"C:\Program Files\Steam")
        );
        assert_eq!(doc.root().get_value("quote"), Some("say \"hi\""));
    }

    #[test]
    fn test_unknown_escape_passes_through() {
        let doc = parse(r#""key" "a\qb""#).unwrap();
        assert_eq!(doc.root().get_value("key"), Some("a\\qb"));
    }

    #[test]
    fn test_newline_inside_quotes_is_part_of_value() {
        let doc = parse("\"key\" \"line one\nline two\"").unwrap();
        assert_eq!(doc.root().get_value("key"), Some("line one\nline two"));
    }

    #[test]
    fn test_unquoted_tokens_tolerated() {
        let doc = parse("key { inner 123 }").unwrap();
        let top = doc.top().unwrap();
        assert_eq!(top.name(), "key");
        assert_eq!(top.get_value("inner"), Some("123"));
    }

    #[test]
    fn test_unterminated_string_reports_opening_quote() {
        let err = parse("\"key\" \"abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 7);
    }

    #[test]
    fn test_unterminated_string_on_later_line() {
        let err = parse("\"a\" \"b\"\n\"key\" \"abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_stray_close_brace_fails() {
        let err = parse("\"a\" \"b\"\n}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnmatchedClose);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn test_unclosed_container_fails() {
        let err = parse("\"root\" {\n\"a\" \"b\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedContainer);
        // Points at the `{` that was never closed
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_key_without_value_fails() {
        let err = parse("\"root\" { \"orphan\" }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue);
        assert_eq!(err.column, 10);

        let err = parse("\"orphan\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue);
    }

    #[test]
    fn test_open_without_key_fails() {
        let err = parse("{ \"a\" \"b\" }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::OpenWithoutKey);
    }

    #[test]
    fn test_empty_input_yields_empty_root() {
        let doc = parse("").unwrap();
        assert!(doc.root().children().is_empty());
        assert!(doc.top().is_none());
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let text = r#"
"libraryfolders"
{
    "0" { "path" "/a" }
    "1" { "path" "/b" }
}
"#;
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    fn kv_string() -> impl Strategy<Value = String> {
        // Printable runs without quotes, braces or backslashes; escapes are
        // covered by the dedicated tests above
        "[ -~&&[^\"{}\\\\]]{0,12}"
    }

    proptest! {
        #[test]
        fn prop_generated_pairs_round_trip(pairs in prop::collection::vec((kv_string(), kv_string()), 0..16)) {
            let mut text = String::new();
            for (key, value) in &pairs {
                text.push_str(&format!("\"{}\" \"{}\"\n", key, value));
            }

            let doc = parse(&text).unwrap();
            let parsed: Vec<(String, String)> = doc
                .root()
                .children()
                .iter()
                .map(|n| (n.name().to_string(), n.value().unwrap_or("").to_string()))
                .collect();

            // Every pair survives, in order, duplicates included
            prop_assert_eq!(parsed, pairs);

            // And a second parse produces an identical tree
            prop_assert_eq!(doc, parse(&text).unwrap());
        }
    }
}
