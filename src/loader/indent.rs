//! Indentation-sensitive line parser.
//!
//! Turns text into a tree of [`ParseNode`]s: each body line becomes a node,
//! lines indented further beneath it become its children, and `#` lines
//! directly above it become its documentation. For example
//!
//! ```text
//! a
//!     # doc
//!     b
//!         c
//!     d
//! ```
//!
//! yields one node `a` with children `b` (documented ` doc`, with child `c`)
//! and `d`.
//!
//! `##` lines are dropped entirely. A blank line discards any documentation
//! collected so far, which lets plain comments sit between definitions.

use std::fmt;

use log::warn;

use super::ParseOptions;
use crate::soc::regs::{RegError, RegResult};

/// Columns added per nesting level by [`render`].
pub const RENDER_INDENT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseNode {
    pub line: String,
    pub children: Vec<ParseNode>,
    pub doc: Vec<String>,
    pub line_no: usize,
}

impl ParseNode {
    /// Whitespace separated tokens of the line.
    pub fn tokens(&self) -> Vec<&str> {
        self.line.split_whitespace().collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Line {
    Eof,
    Blank,
    Comment { indent: usize, text: String },
    Body { indent: usize, text: String },
}

impl Line {
    fn indent(&self) -> usize {
        match self {
            Line::Eof | Line::Blank => 0,
            Line::Comment { indent, .. } | Line::Body { indent, .. } => *indent,
        }
    }
}

/// Classifies raw lines and supports a single line of push-back.
struct LineReader<'src> {
    lines: std::str::SplitInclusive<'src, char>,
    current: Line,
    undo: bool,
    line_no: usize,
    warn: bool,
    warnings: Vec<String>,
}

impl<'src> LineReader<'src> {
    fn new(src: &'src str, options: ParseOptions) -> Self {
        Self {
            lines: src.split_inclusive('\n'),
            current: Line::Eof,
            undo: false,
            line_no: 0,
            warn: options.warn,
            warnings: Vec::new(),
        }
    }

    fn fail(&self, message: &str) -> RegError {
        RegError::parse(message, self.line_no)
    }

    fn warn(&mut self, message: &str) {
        if self.warn {
            let message = format!("{message} on line {}", self.line_no);
            warn!("{message}");
            self.warnings.push(message);
        }
    }

    /// `None` means a `##` line that should be skipped.
    fn read_raw(&mut self) -> RegResult<Option<Line>> {
        let Some(raw) = self.lines.next() else {
            return Ok(Some(Line::Eof));
        };
        self.line_no += 1;
        let Some(body) = raw.strip_suffix('\n') else {
            return Err(self.fail("missing newline at end of line"));
        };
        let content = body.trim_start_matches(' ');
        if content.is_empty() {
            return Ok(Some(Line::Blank));
        }
        let indent = body.len() - content.len();
        if content.starts_with("##") {
            Ok(None)
        } else if let Some(doc) = content.strip_prefix('#') {
            Ok(Some(Line::Comment {
                indent,
                text: doc.to_string(),
            }))
        } else {
            Ok(Some(Line::Body {
                indent,
                text: content.to_string(),
            }))
        }
    }

    fn fill(&mut self, undo: bool) -> RegResult<Line> {
        if !self.undo {
            self.current = loop {
                if let Some(line) = self.read_raw()? {
                    break line;
                }
            };
        }
        self.undo = undo;
        Ok(self.current.clone())
    }

    fn read_line(&mut self) -> RegResult<Line> {
        self.fill(false)
    }

    fn lookahead(&mut self) -> RegResult<Line> {
        self.fill(true)
    }

    fn push_back(&mut self) {
        self.undo = true;
    }
}

/// Parses `src` into its top level nodes.
pub fn parse_indented(src: &str, options: ParseOptions) -> RegResult<Vec<ParseNode>> {
    parse_indented_with_warnings(src, options).map(|(nodes, _)| nodes)
}

/// Like [`parse_indented`], also returning the warnings that were logged.
/// Nothing is collected when `options.warn` is off.
pub fn parse_indented_with_warnings(
    src: &str,
    options: ParseOptions,
) -> RegResult<(Vec<ParseNode>, Vec<String>)> {
    let mut reader = LineReader::new(src, options);
    let nodes = parse_sub_lines(&mut reader, None)?;
    Ok((nodes, reader.warnings))
}

fn parse_comments(input: &mut LineReader<'_>, indent: usize) -> RegResult<Vec<String>> {
    let mut comments = Vec::new();
    loop {
        match input.read_line()? {
            Line::Blank => {
                if !comments.is_empty() {
                    input.warn("discarding documentation lines");
                }
                comments.clear();
            }
            Line::Comment {
                indent: found,
                text,
            } => {
                if found != indent {
                    return Err(input.fail("bad comment indentation"));
                }
                comments.push(text);
            }
            _ => {
                input.push_back();
                return Ok(comments);
            }
        }
    }
}

fn parse_line(input: &mut LineReader<'_>, indent: usize) -> RegResult<Option<ParseNode>> {
    let doc = parse_comments(input, indent)?;
    match input.read_line()? {
        Line::Eof => {
            if !doc.is_empty() {
                input.warn("discarding documentation at end of file");
            }
            Ok(None)
        }
        Line::Body {
            indent: found,
            text,
        } => {
            let line_no = input.line_no;
            if found != indent {
                return Err(input.fail("invalid indentation"));
            }
            let children = parse_sub_lines(input, Some(indent))?;
            Ok(Some(ParseNode {
                line: text,
                children,
                doc,
                line_no,
            }))
        }
        Line::Blank | Line::Comment { .. } => Err(input.fail("unexpected line")),
    }
}

/// Indentation of the next non-blank line, `None` at end of input.
fn find_new_indent(input: &mut LineReader<'_>) -> RegResult<Option<usize>> {
    loop {
        match input.read_line()? {
            Line::Eof => return Ok(None),
            Line::Blank => {}
            line => {
                input.push_back();
                return Ok(Some(line.indent()));
            }
        }
    }
}

fn parse_sub_lines(input: &mut LineReader<'_>, parent: Option<usize>) -> RegResult<Vec<ParseNode>> {
    let mut nodes = Vec::new();
    let Some(level) = find_new_indent(input)? else {
        return Ok(nodes);
    };
    if parent.is_some_and(|parent| level <= parent) {
        return Ok(nodes);
    }
    while let Some(node) = parse_line(input, level)? {
        nodes.push(node);
        let next = input.lookahead()?.indent();
        if next > level {
            return Err(input.fail("invalid indentation"));
        } else if next < level {
            break;
        }
    }
    Ok(nodes)
}

/// Reconstructs source text for `nodes`, using [`RENDER_INDENT`] columns per level.
pub fn render(nodes: &[ParseNode]) -> String {
    let mut out = String::new();
    render_into(&mut out, nodes, 0);
    out
}

fn render_into(out: &mut String, nodes: &[ParseNode], depth: usize) {
    let pad = " ".repeat(depth * RENDER_INDENT);
    for node in nodes {
        for doc in &node.doc {
            out.push_str(&pad);
            out.push('#');
            out.push_str(doc);
            out.push('\n');
        }
        out.push_str(&pad);
        out.push_str(&node.line);
        out.push('\n');
        render_into(out, &node.children, depth + 1);
    }
}

fn dump(f: &mut fmt::Formatter<'_>, node: &ParseNode, prefix: &str) -> fmt::Result {
    for doc in &node.doc {
        writeln!(f, "     {prefix}#{doc}")?;
    }
    writeln!(f, "{:4} {prefix}{}", node.line_no, node.line)?;
    let nested = format!("{prefix}    ");
    for child in &node.children {
        dump(f, child, &nested)?;
    }
    Ok(())
}

/// Numbered listing of the node and its descendants, for debugging.
impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dump(f, self, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const QUIET: ParseOptions = ParseOptions { warn: false };

    fn parse(src: &str) -> RegResult<Vec<ParseNode>> {
        parse_indented(src, QUIET)
    }

    fn node(line: &str, line_no: usize, doc: &[&str], children: Vec<ParseNode>) -> ParseNode {
        ParseNode {
            line: line.into(),
            children,
            doc: doc.iter().map(|d| d.to_string()).collect(),
            line_no,
        }
    }

    fn parse_error_line(result: RegResult<Vec<ParseNode>>) -> (usize, String) {
        match result {
            Err(RegError::Parse { line, message }) => (line, message),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn nests_children_and_attaches_docs() {
        let parsed = parse("a\n    # doc\n    b\n        c\n    d\n").expect("valid input");
        let expected = vec![node(
            "a",
            1,
            &[],
            vec![
                node("b", 3, &[" doc"], vec![node("c", 4, &[], vec![])]),
                node("d", 5, &[], vec![]),
            ],
        )];
        assert_eq!(parsed, expected);
    }

    #[test]
    fn blank_line_discards_pending_documentation() {
        let parsed = parse("# lost\n\n# kept\nx\n").expect("valid input");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].doc, vec![" kept".to_string()]);
    }

    #[test]
    fn double_hash_lines_are_invisible() {
        let parsed = parse("# one\n## note\n# two\nx\n  ## odd indent is fine\ny\n").expect("valid input");
        assert_eq!(parsed[0].doc, vec![" one".to_string(), " two".to_string()]);
        assert_eq!(parsed[1].line, "y");
        assert_eq!(parsed[1].line_no, 6);
    }

    #[test]
    fn blank_lines_between_children_are_skipped() {
        let parsed = parse("!G\n    A RW\n\n    B RW\n\nnext\n").expect("valid input");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].children.len(), 2, "blank lines should not end the block");
        assert_eq!(parsed[1].line, "next");
    }

    #[test]
    fn indentation_between_levels_is_rejected() {
        let (line, message) = parse_error_line(parse("a\n    b\n  c\n"));
        assert_eq!(line, 3);
        assert_eq!(message, "invalid indentation");
    }

    #[test]
    fn deeper_sibling_is_rejected() {
        let (line, _) = parse_error_line(parse("a\n    b\n        c\n      d\n"));
        assert_eq!(line, 4, "d sits between the levels of b and c");
    }

    #[test]
    fn misplaced_comment_is_rejected() {
        let (line, message) = parse_error_line(parse("a\n  # doc\n    b\n"));
        assert_eq!(
            (line, message.as_str()),
            (3, "invalid indentation"),
            "the documentation fixes the child level, so b is out of place"
        );
        let (line, message) = parse_error_line(parse("a\n    # doc\n  # more\n    b\n"));
        assert_eq!((line, message.as_str()), (3, "bad comment indentation"));
    }

    #[test]
    fn missing_trailing_newline_is_fatal() {
        let (line, message) = parse_error_line(parse("a\nb"));
        assert_eq!(line, 2);
        assert!(message.contains("newline"), "unexpected message {message}");
    }

    #[test]
    fn trailing_documentation_is_only_a_warning() {
        let parsed = parse("a\n# dangling\n").expect("dangling docs are not fatal");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn blank_line_after_documentation_warns_once() {
        let src = "a\n# doc\n\nb\n";
        let (nodes, warnings) =
            parse_indented_with_warnings(src, ParseOptions { warn: true }).expect("valid input");
        assert_eq!(nodes.len(), 2);
        assert!(nodes[1].doc.is_empty(), "detached docs are dropped");
        assert_eq!(warnings, ["discarding documentation lines on line 3"]);

        let (_, warnings) = parse_indented_with_warnings(src, QUIET).expect("valid input");
        assert!(warnings.is_empty(), "quiet parsing collects nothing");
    }

    #[test]
    fn empty_input_has_no_nodes() {
        assert!(parse("").expect("empty").is_empty());
        assert!(parse("\n\n").expect("blank").is_empty());
    }

    #[test]
    fn display_lists_line_numbers() {
        let parsed = parse("a\n    b\n").expect("valid input");
        assert_eq!(parsed[0].to_string(), "   1 a\n   2     b\n");
    }

    fn strip_line_numbers(nodes: &mut [ParseNode]) {
        for node in nodes {
            node.line_no = 0;
            strip_line_numbers(&mut node.children);
        }
    }

    fn arb_tree() -> impl Strategy<Value = Vec<ParseNode>> {
        let line = "[A-Za-z!:.*][A-Za-z0-9_ ]{0,8}";
        let docs = prop::collection::vec("[ A-Za-z0-9]{0,10}", 0..3);
        let leaf = (line, docs.clone()).prop_map(|(line, doc)| ParseNode {
            line,
            children: Vec::new(),
            doc,
            line_no: 0,
        });
        let node = leaf.prop_recursive(3, 32, 4, move |inner| {
            (line, docs.clone(), prop::collection::vec(inner, 0..4)).prop_map(
                |(line, doc, children)| ParseNode {
                    line,
                    children,
                    doc,
                    line_no: 0,
                },
            )
        });
        prop::collection::vec(node, 0..4)
    }

    proptest! {
        #[test]
        fn rendering_reparses_to_the_same_tree(tree in arb_tree()) {
            let text = render(&tree);
            let parsed = parse(&text).expect("rendered text should parse");
            let reparsed = parse(&render(&parsed)).expect("second rendering should parse");
            prop_assert_eq!(&parsed, &reparsed);
            let mut shape = parsed.clone();
            strip_line_numbers(&mut shape);
            prop_assert_eq!(shape, tree);
        }
    }
}
