//! Parser for message templates.
//!
//! Compiles template source into a tree of [`Node`]s in two passes: a lexer
//! that splits the source into text and `{{ }}` actions (applying `{{-`/`-}}`
//! whitespace trimming), and a builder that nests `if`/`else`/`end` blocks and
//! resolves every field path against the webhook event schema.

use crate::webhooks::{FieldRef, PathError};

use super::Node;
use super::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A lexed piece of template source.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    /// The trimmed inside of an action, with trim markers removed.
    Action { body: &'a str, offset: usize },
}

/// Compiles template source into nodes.
pub(super) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let tokens = lex(source)?;
    build(tokens)
}

fn lex(source: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    // Set by a `-}}` marker: the next text token loses its leading whitespace.
    let mut trim_next = false;

    while pos < source.len() {
        let Some(rel) = source[pos..].find(OPEN) else {
            push_text(&mut tokens, &source[pos..], trim_next, false);
            break;
        };
        let offset = pos + rel;
        let mut body_start = offset + OPEN.len();

        let trim_left = has_left_trim_marker(&source[body_start..]);
        if trim_left {
            body_start += 1;
        }

        push_text(&mut tokens, &source[pos..offset], trim_next, trim_left);

        let rest = &source[body_start..];
        let close = if rest.trim_start().starts_with("/*") {
            // The closing `*/` may not overlap the opening `/*`.
            let text_start = rest.len() - rest.trim_start().len() + 2;
            let comment_end = rest[text_start..]
                .find("*/")
                .map(|i| text_start + i)
                .ok_or(TemplateError::UnclosedComment { offset })?;
            rest[comment_end + 2..]
                .find(CLOSE)
                .map(|i| comment_end + 2 + i)
                .ok_or(TemplateError::UnclosedComment { offset })?
        } else {
            rest.find(CLOSE)
                .ok_or(TemplateError::UnclosedAction { offset })?
        };

        let mut body = &rest[..close];
        trim_next = has_right_trim_marker(body);
        if trim_next {
            body = &body[..body.len() - 1];
        }

        tokens.push(Token::Action {
            body: body.trim(),
            offset,
        });
        pos = body_start + close + CLOSE.len();
    }

    Ok(tokens)
}

/// `{{- ` trims preceding whitespace; the dash must be followed by whitespace.
fn has_left_trim_marker(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_whitespace())
}

/// ` -}}` trims following whitespace; the dash must be preceded by whitespace.
fn has_right_trim_marker(body: &str) -> bool {
    body.strip_suffix('-')
        .and_then(|b| b.chars().next_back())
        .is_some_and(|c| c.is_ascii_whitespace())
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, trim_start: bool, trim_end: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    let text = if trim_end { text.trim_end() } else { text };
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
}

/// An `{{if}}` block under construction.
struct Frame {
    cond: FieldRef,
    then: Vec<Node>,
    otherwise: Option<Vec<Node>>,
    offset: usize,
    /// Opened by `{{else if}}`: closed by the same `{{end}}` as its parent.
    chained: bool,
}

impl Frame {
    fn new(cond: FieldRef, offset: usize, chained: bool) -> Self {
        Frame {
            cond,
            then: Vec::new(),
            otherwise: None,
            offset,
            chained,
        }
    }

    fn active(&mut self) -> &mut Vec<Node> {
        match &mut self.otherwise {
            Some(otherwise) => otherwise,
            None => &mut self.then,
        }
    }

    fn into_node(self) -> Node {
        Node::If {
            cond: self.cond,
            then: self.then,
            otherwise: self.otherwise.unwrap_or_default(),
        }
    }
}

fn build(tokens: Vec<Token<'_>>) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        let (body, offset) = match token {
            Token::Text(text) => {
                current(&mut root, &mut stack).push(Node::Text(text.to_string()));
                continue;
            }
            Token::Action { body, offset } => (body, offset),
        };

        if body.is_empty() {
            return Err(TemplateError::EmptyAction { offset });
        }

        if body.starts_with("/*") {
            if !body.ends_with("*/") {
                return Err(TemplateError::UnclosedComment { offset });
            }
            continue;
        }

        if body.starts_with('.') {
            let field = parse_field(body, offset)?;
            current(&mut root, &mut stack).push(Node::Field(field));
            continue;
        }

        let (keyword, rest) = split_keyword(body);
        match (keyword, rest) {
            ("if", path) if !path.is_empty() => {
                let cond = parse_field(path, offset)?;
                stack.push(Frame::new(cond, offset, false));
            }
            ("else", "") => {
                let frame = stack
                    .last_mut()
                    .filter(|f| f.otherwise.is_none())
                    .ok_or(TemplateError::UnexpectedElse { offset })?;
                frame.otherwise = Some(Vec::new());
            }
            ("else", chained) => {
                let (inner_keyword, path) = split_keyword(chained);
                if inner_keyword != "if" || path.is_empty() {
                    return Err(unsupported(body, offset));
                }
                let cond = parse_field(path, offset)?;
                let frame = stack
                    .last_mut()
                    .filter(|f| f.otherwise.is_none())
                    .ok_or(TemplateError::UnexpectedElse { offset })?;
                frame.otherwise = Some(Vec::new());
                stack.push(Frame::new(cond, offset, true));
            }
            ("end", "") => loop {
                let frame = stack.pop().ok_or(TemplateError::UnexpectedEnd { offset })?;
                let chained = frame.chained;
                current(&mut root, &mut stack).push(frame.into_node());
                if !chained {
                    break;
                }
            },
            _ => return Err(unsupported(body, offset)),
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(TemplateError::UnclosedIf {
            offset: frame.offset,
        });
    }

    Ok(root)
}

/// The node list new nodes are appended to: the innermost open branch, or the root.
fn current<'s>(root: &'s mut Vec<Node>, stack: &'s mut [Frame]) -> &'s mut Vec<Node> {
    match stack.last_mut() {
        Some(frame) => frame.active(),
        None => root,
    }
}

fn split_keyword(body: &str) -> (&str, &str) {
    match body.split_once(|c: char| c.is_ascii_whitespace()) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (body, ""),
    }
}

/// Parses a field path such as `.Sender.Login` and resolves it.
fn parse_field(path: &str, offset: usize) -> Result<FieldRef, TemplateError> {
    let Some(dotted) = path.strip_prefix('.') else {
        return Err(unsupported(path, offset));
    };

    if dotted.is_empty() {
        return Err(TemplateError::NotPrintable {
            path: path.to_string(),
            offset,
        });
    }

    let segments: Vec<&str> = dotted.split('.').collect();
    let well_formed = segments
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !well_formed {
        return Err(unsupported(path, offset));
    }

    FieldRef::resolve(&segments).map_err(|e| match e {
        PathError::Unknown => TemplateError::UnknownField {
            path: path.to_string(),
            offset,
        },
        PathError::NotScalar => TemplateError::NotPrintable {
            path: path.to_string(),
            offset,
        },
    })
}

fn unsupported(action: &str, offset: usize) -> TemplateError {
    TemplateError::UnsupportedAction {
        action: action.to_string(),
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_splits_text_and_actions() {
        let tokens = lex("a {{ .Ref }} b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a "),
                Token::Action {
                    body: ".Ref",
                    offset: 2
                },
                Token::Text(" b"),
            ]
        );
    }

    #[test]
    fn lex_applies_trim_markers() {
        let tokens = lex("a  \n{{- .Ref -}}\n  b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a"),
                Token::Action {
                    body: ".Ref",
                    offset: 4
                },
                Token::Text("b"),
            ]
        );
    }

    #[test]
    fn dash_without_space_is_not_a_trim_marker() {
        let tokens = lex("a {{-3}} b").unwrap();
        assert_eq!(tokens[0], Token::Text("a "));
        assert_eq!(
            tokens[1],
            Token::Action {
                body: "-3",
                offset: 2
            }
        );
    }

    #[test]
    fn lex_comment_may_contain_close_delimiter() {
        let tokens = lex("{{/* }} */}}x").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Action {
                    body: "/* }} */",
                    offset: 0
                },
                Token::Text("x"),
            ]
        );
    }

    #[test]
    fn lex_reports_unclosed() {
        assert_eq!(
            lex("hi {{ .Ref"),
            Err(TemplateError::UnclosedAction { offset: 3 })
        );
        assert_eq!(
            lex("{{/* nope }}"),
            Err(TemplateError::UnclosedComment { offset: 0 })
        );
    }

    #[test]
    fn comment_close_cannot_reuse_open_delimiter() {
        assert_eq!(
            lex("a{{/*/}}b"),
            Err(TemplateError::UnclosedComment { offset: 1 })
        );
        assert_eq!(
            lex("{{- /*/ -}}"),
            Err(TemplateError::UnclosedComment { offset: 0 })
        );
        assert_eq!(
            lex("{{/**/}}x").unwrap(),
            vec![
                Token::Action {
                    body: "/**/",
                    offset: 0
                },
                Token::Text("x"),
            ]
        );
    }

    #[test]
    fn parse_field_rejects_malformed_paths() {
        assert!(matches!(
            parse_field(".Sender..Login", 0),
            Err(TemplateError::UnsupportedAction { .. })
        ));
        assert!(matches!(
            parse_field(".Sender.Login | printf", 0),
            Err(TemplateError::UnsupportedAction { .. })
        ));
        assert!(matches!(
            parse_field(".", 0),
            Err(TemplateError::NotPrintable { .. })
        ));
    }

    #[test]
    fn build_nests_else_if_chains() {
        let nodes = parse("{{if .Ref}}a{{else if .Sender.Login}}b{{else}}c{{end}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::If {
                cond: FieldRef::Ref,
                then: vec![Node::Text("a".into())],
                otherwise: vec![Node::If {
                    cond: FieldRef::SenderLogin,
                    then: vec![Node::Text("b".into())],
                    otherwise: vec![Node::Text("c".into())],
                }],
            }]
        );
    }

    #[test]
    fn build_rejects_unbalanced_blocks() {
        assert_eq!(
            parse("{{end}}"),
            Err(TemplateError::UnexpectedEnd { offset: 0 })
        );
        assert_eq!(
            parse("{{else}}"),
            Err(TemplateError::UnexpectedElse { offset: 0 })
        );
        assert_eq!(
            parse("x{{if .Ref}}y"),
            Err(TemplateError::UnclosedIf { offset: 1 })
        );
        assert_eq!(
            parse("{{if .Ref}}a{{else}}b{{else}}c{{end}}"),
            Err(TemplateError::UnexpectedElse { offset: 21 })
        );
    }
}
