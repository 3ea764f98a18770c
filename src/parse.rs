//! Tree ingestion from the nested bracket notation and from the node/edge
//! list format, plus the matching writers.
//!
//! Bracket notation nests balanced braces, e.g. `{a{b}{c{d}}}`. The node/edge
//! list format is the `graph [ node [...] edge [...] ]` layout the batch
//! tooling reads; it is parsed into a petgraph graph first and then validated
//! into a [`LabeledTree`].

use crate::tree::{LabeledTree, TreeBuilder, TreeError};
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph as PetGraph};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Malformed tree sources fail fast with one of these, before any matcher
/// runs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unbalanced brackets in subtree starting at byte {0}")]
    UnbalancedBrackets(usize),
    #[error("node starting at byte {0} has no label")]
    MissingLabel(usize),
    #[error("trailing input after the root subtree")]
    TrailingInput,
    #[error("expected {expected} at byte {at}")]
    Expected { expected: &'static str, at: usize },
    #[error("expected an integer, got {0:?}")]
    NotAnInteger(String),
    #[error("node block without an id")]
    NodeWithoutId,
    #[error("node {0} has no label")]
    NodeWithoutLabel(usize),
    #[error("edge block needs both source and target")]
    IncompleteEdge,
    #[error("invalid tree structure: {0}")]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads a tree file in either supported format.
pub fn load_tree(path: &Path) -> Result<LabeledTree<String>, ParseError> {
    let text = fs::read_to_string(path)?;
    parse_tree(&text)
}

/// Dispatches on the leading byte: `{` means bracket notation, anything else
/// the node/edge list format.
pub fn parse_tree(text: &str) -> Result<LabeledTree<String>, ParseError> {
    if text.trim_start().starts_with('{') {
        parse_bracket(text)
    } else {
        parse_gml(text)
    }
}

// === bracket notation ===

struct Cursor<'a> {
    text: &'a str,
    at: usize,
}

impl Cursor<'_> {
    fn byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.at).copied()
    }
}

/// Parses the nested bracket notation. Node indices follow depth-first
/// pre-order, the root at index 0.
pub fn parse_bracket(input: &str) -> Result<LabeledTree<String>, ParseError> {
    let mut cursor = Cursor {
        text: input.trim(),
        at: 0,
    };
    let mut builder = TreeBuilder::new();
    let mut next_id = 0;
    parse_subtree(&mut cursor, &mut builder, &mut next_id, None)?;
    if cursor.at != cursor.text.len() {
        return Err(ParseError::TrailingInput);
    }
    Ok(builder.build()?)
}

fn parse_subtree(
    cursor: &mut Cursor,
    builder: &mut TreeBuilder<String>,
    next_id: &mut usize,
    parent: Option<usize>,
) -> Result<(), ParseError> {
    let open = cursor.at;
    if cursor.byte() != Some(b'{') {
        return Err(ParseError::Expected {
            expected: "'{'",
            at: cursor.at,
        });
    }
    cursor.at += 1;

    let label_start = cursor.at;
    while !matches!(cursor.byte(), Some(b'{') | Some(b'}') | None) {
        cursor.at += 1;
    }
    let label = cursor.text[label_start..cursor.at].trim();
    if label.is_empty() {
        return Err(ParseError::MissingLabel(open));
    }

    let id = *next_id;
    *next_id += 1;
    builder.add_node(id, label.to_string())?;
    if let Some(parent_id) = parent {
        builder.add_edge(parent_id, id);
    }

    loop {
        match cursor.byte() {
            Some(b'{') => parse_subtree(cursor, builder, next_id, Some(id))?,
            Some(b'}') => {
                cursor.at += 1;
                return Ok(());
            }
            Some(_) => {
                return Err(ParseError::Expected {
                    expected: "'{' or '}'",
                    at: cursor.at,
                })
            }
            None => return Err(ParseError::UnbalancedBrackets(open)),
        }
    }
}

/// Renders the tree in bracket notation, children in stored order.
pub fn to_bracket<L: Display>(tree: &LabeledTree<L>) -> String {
    fn write_subtree<L: Display>(tree: &LabeledTree<L>, v: usize, out: &mut String) {
        out.push('{');
        out.push_str(&tree.label(v).to_string());
        for c in tree.children(v) {
            write_subtree(tree, c, out);
        }
        out.push('}');
    }
    let mut out = String::new();
    write_subtree(tree, tree.root(), &mut out);
    out
}

// === node/edge list format ===

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token<'_>)>, ParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut at = 0;
    while at < bytes.len() {
        match bytes[at] {
            b if b.is_ascii_whitespace() => at += 1,
            b'[' => {
                tokens.push((at, Token::Open));
                at += 1;
            }
            b']' => {
                tokens.push((at, Token::Close));
                at += 1;
            }
            b'"' => {
                let start = at + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end] != b'"' {
                    end += 1;
                }
                if end == bytes.len() {
                    return Err(ParseError::Expected {
                        expected: "closing '\"'",
                        at,
                    });
                }
                tokens.push((at, Token::Word(&input[start..end])));
                at = end + 1;
            }
            _ => {
                let start = at;
                while at < bytes.len()
                    && !bytes[at].is_ascii_whitespace()
                    && bytes[at] != b'['
                    && bytes[at] != b']'
                {
                    at += 1;
                }
                tokens.push((start, Token::Word(&input[start..at])));
            }
        }
    }
    Ok(tokens)
}

struct TokenStream<'a> {
    tokens: Vec<(usize, Token<'a>)>,
    at: usize,
}

impl<'a> TokenStream<'a> {
    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.at).map(|&(_, t)| t);
        if token.is_some() {
            self.at += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.at)
            .map(|&(pos, _)| pos)
            .or_else(|| self.tokens.last().map(|&(pos, _)| pos))
            .unwrap_or(0)
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        match self.next() {
            Some(Token::Word(w)) if w == keyword => Ok(()),
            _ => Err(ParseError::Expected {
                expected: keyword,
                at: self.position(),
            }),
        }
    }

    fn expect_open(&mut self) -> Result<(), ParseError> {
        match self.next() {
            Some(Token::Open) => Ok(()),
            _ => Err(ParseError::Expected {
                expected: "'['",
                at: self.position(),
            }),
        }
    }

    /// One scalar attribute value (a word; a nested block is an error here).
    fn value(&mut self) -> Result<&'a str, ParseError> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            _ => Err(ParseError::Expected {
                expected: "attribute value",
                at: self.position(),
            }),
        }
    }

    fn integer(&mut self) -> Result<usize, ParseError> {
        let word = self.value()?;
        word.parse()
            .map_err(|_| ParseError::NotAnInteger(word.to_string()))
    }
}

/// Parses the node/edge list format into a petgraph graph, then validates the
/// rooted-tree shape.
pub fn parse_gml(input: &str) -> Result<LabeledTree<String>, ParseError> {
    let mut stream = TokenStream {
        tokens: tokenize(input)?,
        at: 0,
    };
    stream.expect_keyword("graph")?;
    stream.expect_open()?;

    let mut nodes: Vec<(usize, String)> = Vec::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    loop {
        match stream.next() {
            Some(Token::Close) => break,
            Some(Token::Word("node")) => nodes.push(parse_node_block(&mut stream)?),
            Some(Token::Word("edge")) => edges.push(parse_edge_block(&mut stream)?),
            // scalar graph attribute such as `directed 1`
            Some(Token::Word(_)) => {
                stream.value()?;
            }
            _ => {
                return Err(ParseError::Expected {
                    expected: "']'",
                    at: stream.position(),
                })
            }
        }
    }
    if stream.next().is_some() {
        return Err(ParseError::TrailingInput);
    }

    let mut pg: PetGraph<String, (), Directed> = PetGraph::new();
    let mut indices: BTreeMap<usize, NodeIndex> = BTreeMap::new();
    for (id, label) in nodes {
        if indices.insert(id, pg.add_node(label)).is_some() {
            return Err(TreeError::DuplicateNode(id).into());
        }
    }
    for (source, target) in edges {
        let &s = indices.get(&source).ok_or(TreeError::UnknownNode(source))?;
        let &t = indices.get(&target).ok_or(TreeError::UnknownNode(target))?;
        pg.add_edge(s, t, ());
    }
    Ok(LabeledTree::from_petgraph(&pg)?)
}

fn parse_node_block(stream: &mut TokenStream) -> Result<(usize, String), ParseError> {
    stream.expect_open()?;
    let mut id = None;
    let mut label = None;
    loop {
        match stream.next() {
            Some(Token::Close) => break,
            Some(Token::Word("id")) => id = Some(stream.integer()?),
            Some(Token::Word("lbl")) | Some(Token::Word("label")) => {
                label = Some(stream.value()?.to_string())
            }
            Some(Token::Word(_)) => {
                stream.value()?;
            }
            _ => {
                return Err(ParseError::Expected {
                    expected: "node attribute",
                    at: stream.position(),
                })
            }
        }
    }
    let id = id.ok_or(ParseError::NodeWithoutId)?;
    let label = label.ok_or(ParseError::NodeWithoutLabel(id))?;
    Ok((id, label))
}

fn parse_edge_block(stream: &mut TokenStream) -> Result<(usize, usize), ParseError> {
    stream.expect_open()?;
    let mut source = None;
    let mut target = None;
    loop {
        match stream.next() {
            Some(Token::Close) => break,
            Some(Token::Word("source")) => source = Some(stream.integer()?),
            Some(Token::Word("target")) => target = Some(stream.integer()?),
            Some(Token::Word(_)) => {
                stream.value()?;
            }
            _ => {
                return Err(ParseError::Expected {
                    expected: "edge attribute",
                    at: stream.position(),
                })
            }
        }
    }
    match (source, target) {
        (Some(s), Some(t)) => Ok((s, t)),
        _ => Err(ParseError::IncompleteEdge),
    }
}

/// Writes the node/edge list format the batch tooling reads.
pub fn to_gml<L: Display>(tree: &LabeledTree<L>) -> String {
    let mut out = String::from("graph [\n  directed 1\n");
    for v in 0..tree.num_nodes() {
        out.push_str(&format!(
            "  node [\n    id {}\n    lbl \"{}\"\n  ]\n",
            v,
            tree.label(v)
        ));
    }
    for (p, c) in tree.duos() {
        out.push_str(&format!(
            "  edge [\n    source {}\n    target {}\n  ]\n",
            p, c
        ));
    }
    out.push_str("]\n");
    out
}
