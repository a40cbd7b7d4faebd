//! GML reader.
//!
//! Supports the subset of GML that graph tools emit in practice:
//!
//! ```text
//! graph [
//!   directed 1
//!   node [ id 0 label "A" ]
//!   node [ id 1 label "B" ]
//!   edge [ source 0 target 1 ]
//! ]
//! ```
//!
//! A node is named by its `label` when it has one, otherwise by its `id`.
//! Edges always refer to node `id`s. Graphs without `directed 1` are
//! undirected and get both directions of every edge. Keys the engines have
//! no use for (`graphics`, `weight`, ...) are parsed and ignored.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use tracing::debug;

use crate::{DiGraph, GraphError, NodeId};

/// A parsed GML value.
#[derive(Debug, Clone, PartialEq)]
pub enum GmlValue {
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<GmlEntry>),
}

/// One `key value` pair, with the line the key appeared on.
#[derive(Debug, Clone, PartialEq)]
pub struct GmlEntry {
    pub key: String,
    pub value: GmlValue,
    pub line: usize,
}

/// Parse GML text into a [`DiGraph`].
///
/// # Errors
/// [`GraphError::Parse`] for malformed syntax, a missing `graph` list,
/// duplicate node names, or edges that reference unknown ids.
pub fn parse_gml(input: &str) -> Result<DiGraph, GraphError> {
    let entries = parse_entries(input)?;

    let (graph_entries, graph_line) = entries
        .iter()
        .find_map(|e| match (&e.key[..], &e.value) {
            ("graph", GmlValue::List(items)) => Some((items, e.line)),
            _ => None,
        })
        .ok_or_else(|| parse_error(1, "no top-level `graph [ ... ]` list"))?;

    let directed = graph_entries
        .iter()
        .any(|e| e.key == "directed" && e.value == GmlValue::Int(1));

    let mut graph = DiGraph::new();
    // GML id (as text) -> node name
    let mut names: HashMap<String, NodeId> = HashMap::new();

    for entry in graph_entries.iter().filter(|e| e.key == "node") {
        let GmlValue::List(fields) = &entry.value else {
            return Err(parse_error(entry.line, "`node` must be a list"));
        };
        let id = scalar_field(fields, "id")
            .ok_or_else(|| parse_error(entry.line, "node without an `id`"))?;
        let name = match field(fields, "label") {
            Some(GmlValue::Str(label)) => label.clone(),
            _ => id.clone(),
        };
        if names.contains_key(&id) {
            return Err(parse_error(entry.line, format!("duplicate node id {id}")));
        }
        if !graph.add_node(name.clone()) {
            return Err(parse_error(entry.line, format!("duplicate node label '{name}'")));
        }
        names.insert(id, name);
    }

    for entry in graph_entries.iter().filter(|e| e.key == "edge") {
        let GmlValue::List(fields) = &entry.value else {
            return Err(parse_error(entry.line, "`edge` must be a list"));
        };
        let source = endpoint(&names, fields, "source", entry.line)?;
        let target = endpoint(&names, fields, "target", entry.line)?;

        graph.add_edge(source, target)?;
        if !directed {
            graph.add_edge(target, source)?;
        }
    }

    debug!(
        nodes = names.len(),
        edges = graph.edge_count(),
        directed,
        line = graph_line,
        "parsed GML graph"
    );
    Ok(graph)
}

/// Resolve an edge's `source`/`target` id to the node name.
fn endpoint<'a>(
    names: &'a HashMap<String, NodeId>,
    fields: &[GmlEntry],
    key: &str,
    line: usize,
) -> Result<&'a NodeId, GraphError> {
    let id = scalar_field(fields, key)
        .ok_or_else(|| parse_error(line, format!("edge without a `{key}`")))?;
    names
        .get(&id)
        .ok_or_else(|| parse_error(line, format!("edge {key} {id} is not a node")))
}

fn field<'a>(fields: &'a [GmlEntry], key: &str) -> Option<&'a GmlValue> {
    fields.iter().find(|e| e.key == key).map(|e| &e.value)
}

/// Integer or string field rendered as text, so ids of either kind compare.
fn scalar_field(fields: &[GmlEntry], key: &str) -> Option<String> {
    match field(fields, key)? {
        GmlValue::Int(i) => Some(i.to_string()),
        GmlValue::Str(s) => Some(s.clone()),
        _ => None,
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> GraphError {
    GraphError::Parse { line, message: message.into() }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Key(String),
    Value(GmlValue),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1 }
    }

    /// Next token and the line it starts on.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, GraphError> {
        self.skip_whitespace_and_comments();
        let line = self.line;

        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '[' => {
                self.chars.next();
                Token::Open
            }
            ']' => {
                self.chars.next();
                Token::Close
            }
            '"' => {
                self.chars.next();
                Token::Value(GmlValue::Str(self.string(line)?))
            }
            c if c.is_ascii_alphabetic() || c == '_' => Token::Key(self.take_while(|c| {
                c.is_ascii_alphanumeric() || c == '_'
            })),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let raw = self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
                Token::Value(number(&raw, line)?)
            }
            other => return Err(parse_error(line, format!("unexpected character '{other}'"))),
        };
        Ok(Some((token, line)))
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
                self.chars.next();
            } else if c.is_whitespace() {
                self.chars.next();
            } else if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                break;
            }
        }
    }

    fn string(&mut self, start_line: usize) -> Result<String, GraphError> {
        let mut out = String::new();
        for c in self.chars.by_ref() {
            match c {
                '"' => return Ok(out),
                '\n' => {
                    self.line += 1;
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        Err(parse_error(start_line, "unterminated string"))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }
}

fn number(raw: &str, line: usize) -> Result<GmlValue, GraphError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(GmlValue::Int(i));
    }
    raw.parse::<f64>()
        .map(GmlValue::Real)
        .map_err(|_| parse_error(line, format!("invalid number '{raw}'")))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse the whole document as a sequence of `key value` entries.
pub fn parse_entries(input: &str) -> Result<Vec<GmlEntry>, GraphError> {
    let mut lexer = Lexer::new(input);
    let entries = parse_list(&mut lexer, None)?;
    Ok(entries)
}

/// Parse entries until `]` (when `opened_on` is set) or end of input.
fn parse_list(lexer: &mut Lexer<'_>, opened_on: Option<usize>) -> Result<Vec<GmlEntry>, GraphError> {
    let mut entries = Vec::new();

    loop {
        let Some((token, line)) = lexer.next_token()? else {
            return match opened_on {
                Some(open_line) => Err(parse_error(open_line, "unclosed '['")),
                None => Ok(entries),
            };
        };

        let key = match token {
            Token::Key(key) => key,
            Token::Close if opened_on.is_some() => return Ok(entries),
            Token::Close => return Err(parse_error(line, "unmatched ']'")),
            other => return Err(parse_error(line, format!("expected a key, found {other:?}"))),
        };

        let value = match lexer.next_token()? {
            Some((Token::Value(value), _)) => value,
            Some((Token::Open, open_line)) => GmlValue::List(parse_list(lexer, Some(open_line))?),
            Some((other, value_line)) => {
                return Err(parse_error(value_line, format!("expected a value for `{key}`, found {other:?}")))
            }
            None => return Err(parse_error(line, format!("missing value for `{key}`"))),
        };

        entries.push(GmlEntry { key, value, line });
    }
}
