//! Lexer for HCL source.
//!
//! Tokenizes with logos. Newlines are significant in HCL bodies (they end an
//! attribute), so they are emitted as tokens, except inside `(...)` and
//! `[...]` where HCL ignores them.
//!
//! Quoted strings and heredocs are scanned whole by callbacks. A string with
//! no unescaped `${` or `%{` becomes [`Text::Literal`] with its escapes
//! processed; anything else is kept raw as [`Text::Template`].

use std::fmt;
use std::ops::Range;

use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("?")]
    Question,
    #[token("=>")]
    FatArrow,
    #[token("\n")]
    Newline,

    // Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Comparison and logic
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Bang,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok().filter(|n| n.is_finite()))]
    Number(f64),

    #[token("\"", quoted)]
    String(Text),

    #[regex(r"<<-?[A-Za-z_][A-Za-z0-9_-]*\r?\n", heredoc)]
    Heredoc(Text),

    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

/// The contents of a quoted string or heredoc.
#[derive(Debug, Clone, PartialEq)]
pub enum Text {
    /// No interpolation; escapes already processed.
    Literal(String),
    /// Contains `${...}` or `%{...}`; the raw source between the delimiters.
    Template(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Eq => write!(f, "'='"),
            Token::Colon => write!(f, "':'"),
            Token::DoubleColon => write!(f, "'::'"),
            Token::Dot => write!(f, "'.'"),
            Token::Ellipsis => write!(f, "'...'"),
            Token::Question => write!(f, "'?'"),
            Token::FatArrow => write!(f, "'=>'"),
            Token::Newline => write!(f, "newline"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::LtEq => write!(f, "'<='"),
            Token::GtEq => write!(f, "'>='"),
            Token::And => write!(f, "'&&'"),
            Token::Or => write!(f, "'||'"),
            Token::Bang => write!(f, "'!'"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::String(Text::Literal(s)) => write!(f, "string {s:?}"),
            Token::String(Text::Template(_)) => write!(f, "string template"),
            Token::Heredoc(_) => write!(f, "heredoc"),
            Token::Ident(s) => write!(f, "identifier {s}"),
        }
    }
}

fn quoted(lex: &mut Lexer<Token>) -> Option<Text> {
    let (len, text) = scan_string(lex.remainder())?;
    lex.bump(len);
    Some(text)
}

fn heredoc(lex: &mut Lexer<Token>) -> Option<Text> {
    let (len, text) = scan_heredoc(lex.slice(), lex.remainder())?;
    lex.bump(len);
    Some(text)
}

/// Scan a quoted string whose opening quote was already consumed.
///
/// Returns the byte length through the closing quote and the contents.
fn scan_string(rest: &str) -> Option<(usize, Text)> {
    let (len, template) = quoted_len(rest)?;
    let inner = &rest[..len - 1];
    let text = if template {
        Text::Template(inner.to_string())
    } else {
        Text::Literal(unescape(inner)?)
    };
    Some((len, text))
}

/// Length through the closing quote, and whether the string interpolates.
fn quoted_len(rest: &str) -> Option<(usize, bool)> {
    let bytes = rest.as_bytes();
    let mut template = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some((i + 1, template)),
            b'\n' => return None,
            b'\\' => i += 2,
            b'$' | b'%' if is_escaped_opener(&bytes[i..]) => i += 3,
            b'$' | b'%' if bytes.get(i + 1) == Some(&b'{') => {
                template = true;
                i += 2 + interpolation_len(&rest[i + 2..])?;
            }
            _ => i += 1,
        }
    }
    None
}

/// Length of an interpolation or directive body through its closing brace.
/// Quoted strings nested inside it are skipped whole.
fn interpolation_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i + 1),
            b'}' => depth -= 1,
            b'"' => {
                let (len, _) = quoted_len(&rest[i + 1..])?;
                i += 1 + len;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// `$${` and `%%{` stand for a literal `${` and `%{`.
fn is_escaped_opener(bytes: &[u8]) -> bool {
    matches!(bytes, [a, b, b'{', ..] if a == b && (*a == b'$' || *a == b'%'))
}

/// True when `text` holds an unescaped `${` or `%{`.
fn interpolates(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if is_escaped_opener(&bytes[i..]) {
            i += 3;
            continue;
        }
        if matches!(bytes[i], b'$' | b'%') && bytes.get(i + 1) == Some(&b'{') {
            return true;
        }
        i += 1;
    }
    false
}

/// Process escapes in the contents of a quoted string.
///
/// Returns `None` (a lex error) on an unknown escape or a bad `\u` sequence.
fn unescape(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '$' | '%' if chars.peek() == Some(&ch) => {
                // `$${` is `${`; a doubled marker before anything else is kept as is.
                chars.next();
                out.push(ch);
                if chars.peek() != Some(&'{') {
                    out.push(ch);
                }
            }
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                'u' => out.push(unicode_escape(&mut chars, 4)?),
                'U' => out.push(unicode_escape(&mut chars, 8)?),
                _ => return None,
            },
            _ => out.push(ch),
        }
    }

    Some(out)
}

fn unicode_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return None;
    }
    char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
}

/// Scan a heredoc body. `header` is `<<MARKER\n` or `<<-MARKER\n`; `rest`
/// starts on the first content line.
///
/// The closing marker may be indented. The newline after it is left for the
/// body parser. The `<<-` form strips the smallest indentation shared by
/// the non-blank lines.
fn scan_heredoc(header: &str, rest: &str) -> Option<(usize, Text)> {
    let indented = header.starts_with("<<-");
    let marker = header.trim_start_matches('<').trim_start_matches('-').trim_end();

    let mut lines = Vec::new();
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == marker {
            let len = offset + line.trim_end().len();
            return Some((len, heredoc_text(&lines, indented)));
        }
        lines.push(line);
        offset += line.len();
    }
    None
}

fn heredoc_text(lines: &[&str], indented: bool) -> Text {
    let strip = if indented {
        lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0)
    } else {
        0
    };

    let body: String = lines
        .iter()
        .map(|line| {
            line.get(strip..)
                .unwrap_or_else(|| line.trim_start_matches([' ', '\t']))
        })
        .collect();

    if interpolates(&body) {
        Text::Template(body)
    } else {
        Text::Literal(body.replace("$${", "${").replace("%%{", "%{"))
    }
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Text the lexer could not turn into a token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unexpected input {text:?} at {}..{}", span.start, span.end)]
pub struct LexError {
    pub span: Range<usize>,
    pub text: String,
}

/// Tokenize a whole source text, collecting every lex error.
///
/// Newlines nested inside parentheses or brackets are dropped.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, Vec<LexError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut nesting = Vec::new();

    for (result, span) in Token::lexer(source).spanned() {
        let token = match result {
            Ok(token) => token,
            Err(()) => {
                errors.push(LexError {
                    text: source[span.clone()].to_string(),
                    span,
                });
                continue;
            }
        };
        match &token {
            Token::LBrace | Token::LParen | Token::LBracket => nesting.push(token.clone()),
            Token::RBrace | Token::RParen | Token::RBracket => {
                nesting.pop();
            }
            Token::Newline if matches!(nesting.last(), Some(Token::LParen | Token::LBracket)) => {
                continue;
            }
            _ => {}
        }
        tokens.push(Spanned { token, span });
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    fn literal(s: &str) -> Token {
        Token::String(Text::Literal(s.into()))
    }

    #[test]
    fn type_expression() {
        assert_eq!(
            kinds("object({a = optional(string, \"x\")})"),
            vec![
                Token::Ident("object".into()),
                Token::LParen,
                Token::LBrace,
                Token::Ident("a".into()),
                Token::Eq,
                Token::Ident("optional".into()),
                Token::LParen,
                Token::Ident("string".into()),
                Token::Comma,
                literal("x"),
                Token::RParen,
                Token::RBrace,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(
            kinds("true false null nullable"),
            vec![
                Token::True,
                Token::False,
                Token::Null,
                Token::Ident("nullable".into()),
            ]
        );
    }

    #[test]
    fn comments_skipped_newlines_kept() {
        assert_eq!(
            kinds("a = 1 # trailing\n// line\n/* block */ b"),
            vec![
                Token::Ident("a".into()),
                Token::Eq,
                Token::Number(1.0),
                Token::Newline,
                Token::Newline,
                Token::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn newlines_inside_brackets_are_dropped() {
        assert_eq!(
            kinds("f(\n1,\n[\n2\n]\n)\n{\n}"),
            vec![
                Token::Ident("f".into()),
                Token::LParen,
                Token::Number(1.0),
                Token::Comma,
                Token::LBracket,
                Token::Number(2.0),
                Token::RBracket,
                Token::RParen,
                Token::Newline,
                Token::LBrace,
                Token::Newline,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("a >= 1 && !b || c != d ? x... : y => z"),
            vec![
                Token::Ident("a".into()),
                Token::GtEq,
                Token::Number(1.0),
                Token::And,
                Token::Bang,
                Token::Ident("b".into()),
                Token::Or,
                Token::Ident("c".into()),
                Token::NotEq,
                Token::Ident("d".into()),
                Token::Question,
                Token::Ident("x".into()),
                Token::Ellipsis,
                Token::Colon,
                Token::Ident("y".into()),
                Token::FatArrow,
                Token::Ident("z".into()),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""tab\there \"q\" é \U0001F600""#),
            vec![literal("tab\there \"q\" é \u{1F600}")]
        );
    }

    #[test]
    fn escaped_template_markers_are_literal() {
        assert_eq!(kinds(r#""$${x} %%{if}""#), vec![literal("${x} %{if}")]);
        assert_eq!(kinds(r#""$$ 100%""#), vec![literal("$$ 100%")]);
    }

    #[test]
    fn templates_keep_raw_text() {
        assert_eq!(
            kinds(r#""${join(",", var.l)}-${x}""#),
            vec![Token::String(Text::Template(r#"${join(",", var.l)}-${x}"#.into()))]
        );
        assert_eq!(
            kinds(r#""%{ if x }y%{ endif }""#),
            vec![Token::String(Text::Template("%{ if x }y%{ endif }".into()))]
        );
    }

    #[test]
    fn heredocs() {
        let source = "a = <<EOT\nhello\n  ${x}\nEOT\nb = <<-EOT\n    one\n      two\n    EOT\n";
        let tokens = kinds(source);
        assert_eq!(
            tokens[2],
            Token::Heredoc(Text::Template("hello\n  ${x}\n".into()))
        );
        assert_eq!(tokens[3], Token::Newline);
        assert_eq!(
            tokens[6],
            Token::Heredoc(Text::Literal("one\n  two\n".into()))
        );
        assert_eq!(tokens.last(), Some(&Token::Newline));
    }

    #[test]
    fn unterminated_heredoc_is_an_error() {
        assert!(tokenize("a = <<EOT\nnever closed\n").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("0 2.5 1e3"),
            vec![Token::Number(0.0), Token::Number(2.5), Token::Number(1000.0)]
        );
    }

    #[test]
    fn overflowing_number_is_an_error() {
        let errors = tokenize("a = 1e400").unwrap_err();
        assert_eq!(errors[0].text, "1e400");
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = tokenize("ab = \"é\"").unwrap();
        assert_eq!(tokens[0].span, 0..2);
        assert_eq!(tokens[2].span, 5..9);
    }

    #[test]
    fn unknown_character_is_an_error() {
        let errors = tokenize("a = @").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "@");
        assert_eq!(errors[0].span, 4..5);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("a = \"open\n").is_err());
    }
}
