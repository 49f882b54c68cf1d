// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The rule tokenizer (C1): splits raw rule text into the seven header
//! fields and a raw option segment, honoring bracket-list mode, escaped
//! terminators, and quoting.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    error::{ErrorKind, ParseError},
};

use crate::error::{NomRes, OurNomError, SigError};

/// The seven whitespace-separated header fields plus the raw text between
/// the outermost `(` and its matching `)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedRule<'a> {
    pub action: &'a str,
    pub proto: &'a str,
    pub src: &'a str,
    pub sp: &'a str,
    pub dir: &'a str,
    pub dst: &'a str,
    pub dp: &'a str,
    pub options: &'a str,
}

fn is_ws(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_disallowed_control(c: char) -> bool {
    c.is_control() && c != '\t' && c != '\n' && c != '\r'
}

/// A bracketed field, tracking bracket depth so a nested list (`[a,[b,c]]`)
/// is absorbed as one field instead of stopping at the first `]` (System
/// Overview, C1: "handle bracket-nesting for lists").
fn bracketed(i: &str) -> NomRes<&str> {
    if !i.starts_with('[') {
        return Err(nom::Err::Error(OurNomError::from_error_kind(i, ErrorKind::Char)));
    }
    let mut depth = 0i32;
    for (idx, c) in i.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let end = idx + c.len_utf8();
                    return Ok((&i[end..], &i[..end]));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(OurNomError::from_error_kind(i, ErrorKind::Char)))
}

/// A single header field: either a bracketed list (absorbing internal
/// whitespace) or a run of non-whitespace characters.
fn field(i: &str) -> NomRes<&str> {
    alt((bracketed, take_while1(|c: char| !is_ws(c) && c != '(')))(i)
}

fn ws1(i: &str) -> NomRes<&str> {
    take_while1(is_ws)(i)
}

fn ws0(i: &str) -> NomRes<&str> {
    take_while(is_ws)(i)
}

/// Splits one rule line into its lexical pieces (§4.1).
pub fn lex_rule(input: &str) -> Result<LexedRule<'_>, SigError> {
    let trimmed = input.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        return Err(SigError::EmptyRule);
    }
    if trimmed.chars().any(is_disallowed_control) {
        return Err(SigError::BadControlChar);
    }

    let (rest, action) = field(trimmed)?;
    let (rest, _) = ws1(rest)?;
    let (rest, proto) = field(rest)?;
    let (rest, _) = ws1(rest)?;
    let (rest, src) = field(rest)?;
    let (rest, _) = ws1(rest)?;
    let (rest, sp) = field(rest)?;
    let (rest, _) = ws1(rest)?;
    let (rest, dir) = field(rest)?;
    let (rest, _) = ws1(rest)?;
    let (rest, dst) = field(rest)?;
    let (rest, _) = ws1(rest)?;
    let (rest, dp) = field(rest)?;
    let (rest, _) = ws0(rest)?;

    let (rest, _): (&str, &str) =
        tag("(")(rest).map_err(|_: nom::Err<crate::error::OurNomError<'_>>| SigError::MissingOptionOpen)?;

    let options = rest
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| SigError::UnterminatedOption("missing closing ')'".to_string()))?
        .trim();

    Ok(LexedRule {
        action,
        proto,
        src,
        sp,
        dir,
        dst,
        dp,
        options,
    })
}

/// Splits an option segment into raw `name[:value]` strings. An option ends
/// at the first unescaped `;`; `\;` is the only escape this layer interprets
/// (§4.1). Brackets have no role in this split — a bracketed list's `;`, if
/// it ever has one, is not this layer's concern, and a quoted value's own
/// `[`/`]` must never suppress a real terminator.
pub fn split_options(options: &str) -> Result<Vec<String>, SigError> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = options.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&';') => {
                current.push(';');
                chars.next();
            }
            ';' => {
                let trimmed = current.trim().to_string();
                if !trimmed.is_empty() {
                    out.push(trimmed);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let trailing = current.trim();
    if !trailing.is_empty() {
        return Err(SigError::UnterminatedOption(trailing.to_string()));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_simple_rule() {
        let lexed = lex_rule(r#"alert tcp any any -> any any (msg:"t"; sid:1;)"#).unwrap();
        assert_eq!(lexed.action, "alert");
        assert_eq!(lexed.proto, "tcp");
        assert_eq!(lexed.dir, "->");
        assert_eq!(lexed.options, r#"msg:"t"; sid:1;"#);
    }

    #[test]
    fn lexes_bracketed_fields_with_internal_whitespace() {
        let lexed = lex_rule("alert tcp [1.1.1.1, 2.2.2.2] any -> any any (sid:1;)").unwrap();
        assert_eq!(lexed.src, "[1.1.1.1, 2.2.2.2]");
    }

    #[test]
    fn lexes_nested_bracketed_fields_as_one_field() {
        let lexed = lex_rule("alert tcp [1.1.1.1,[2.2.2.2, 3.3.3.3]] any -> any any (sid:1;)").unwrap();
        assert_eq!(lexed.src, "[1.1.1.1,[2.2.2.2, 3.3.3.3]]");
        assert_eq!(lexed.sp, "any");
    }

    #[test]
    fn rejects_missing_option_open() {
        assert!(matches!(
            lex_rule("alert tcp any any -> any any sid:1;"),
            Err(SigError::MissingOptionOpen)
        ));
    }

    #[test]
    fn rejects_unterminated_options() {
        assert!(matches!(
            lex_rule(r#"alert tcp any any -> any any (msg:"t""#),
            Err(SigError::UnterminatedOption(_))
        ));
    }

    #[test]
    fn rejects_empty_rule() {
        assert!(matches!(lex_rule("   "), Err(SigError::EmptyRule)));
    }

    #[test]
    fn splits_options_honoring_escaped_semicolon() {
        let opts = split_options(r#"msg:"a\;b"; sid:1;"#).unwrap();
        assert_eq!(opts, vec![r#"msg:"a;b""#, "sid:1"]);
    }

    #[test]
    fn splits_options_with_commas_inside_a_single_option() {
        let opts = split_options("threshold:type limit, track by_src, count 1, seconds 60;").unwrap();
        assert_eq!(opts.len(), 1);
    }

    #[test]
    fn splits_options_ignores_unbalanced_brackets_in_a_quoted_value() {
        let opts = split_options(r#"content:"["; sid:1;"#).unwrap();
        assert_eq!(opts, vec![r#"content:"[""#, "sid:1"]);
    }
}
