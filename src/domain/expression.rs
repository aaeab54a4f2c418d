//! Kernel expressions: binary trees of named base kernels.
//!
//! Grammar (whitespace between tokens is insignificant):
//! - `(<expr> <op> <expr>)` is a binary node, `<op>` being one character
//! - anything else is a leaf name, scanned up to a space, `)`, `+`, `*`;
//!   a `(` inside a name pulls in the whole balanced span, e.g. `RBF(id=3)`
//!
//! Parsing never fails. Corrupt tokens degrade to placeholder leaves
//! ([`EMPTY_TOKEN`] or [`EXHAUSTED`]).

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::path::{Direction, Path};

/// Placeholder name for a token that scanned to nothing.
pub const EMPTY_TOKEN: &str = "X";

/// Placeholder name when input ended before a leaf could be read.
pub const EXHAUSTED: &str = "?";

const HIGHLIGHT_OPEN: &str = "[[";
const HIGHLIGHT_CLOSE: &str = "]]";

/// A kernel expression tree.
///
/// Drop, clone, comparison and printing walk the tree with explicit work
/// stacks: nesting depth does not bound the call stack.
pub enum ExpressionNode {
    /// Named base kernel
    Leaf { name: String },
    /// Binary combination of two sub-kernels
    Binary {
        operator: char,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
}

impl ExpressionNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::Leaf { name: name.into() }
    }

    pub fn binary(operator: char, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Parse a kernel expression. See the module docs for the grammar.
    pub fn parse(text: &str) -> Self {
        let clean = strip_highlight(text);
        if clean.is_empty() {
            return Self::leaf(EMPTY_TOKEN);
        }
        let chars: Vec<char> = clean.chars().collect();
        Parser::new(&chars).parse()
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Leaf { name } => Some(name),
            Self::Binary { .. } => None,
        }
    }

    pub fn operator(&self) -> Option<char> {
        match self {
            Self::Leaf { .. } => None,
            Self::Binary { operator, .. } => Some(*operator),
        }
    }

    pub fn left(&self) -> Option<&ExpressionNode> {
        match self {
            Self::Leaf { .. } => None,
            Self::Binary { left, .. } => Some(left.as_ref()),
        }
    }

    pub fn right(&self) -> Option<&ExpressionNode> {
        match self {
            Self::Leaf { .. } => None,
            Self::Binary { right, .. } => Some(right.as_ref()),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// True if the tree contains a placeholder leaf anywhere.
    pub fn has_placeholder(&self) -> bool {
        self.fold(
            |name| matches!(name, EMPTY_TOKEN | EXHAUSTED),
            |_, left, right| left || right,
        )
    }

    /// Parenthesized textual form: `(<left> <op> <right>)`, or the leaf name.
    pub fn pretty(&self) -> String {
        self.to_string()
    }

    /// Follow `path` from this node.
    ///
    /// Returns `None` when a leaf is reached before the path is exhausted
    /// or the path contains a symbol other than `L`/`R`.
    pub fn resolve(&self, path: &Path) -> Option<&ExpressionNode> {
        let mut current = self;
        for direction in path.iter() {
            current = match (current, direction) {
                (Self::Binary { left, .. }, Direction::Left) => left.as_ref(),
                (Self::Binary { right, .. }, Direction::Right) => right.as_ref(),
                _ => return None,
            };
        }
        Some(current)
    }

    /// Pre-order traversal yielding every node with its path, left before right.
    pub fn iter_with_paths(&self) -> PathIter<'_> {
        PathIter {
            stack: vec![(Path::root(), self)],
        }
    }

    pub fn node_count(&self) -> usize {
        self.fold(|_| 1, |_, left, right| left + right + 1)
    }

    /// Number of levels; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        self.fold(|_| 1, |_, left, right| left.max(right) + 1)
    }

    /// Post-order fold: `leaf` maps leaf names, `binary` combines the folded
    /// children of each operator node.
    pub fn fold<T>(
        &self,
        mut leaf: impl FnMut(&str) -> T,
        mut binary: impl FnMut(char, T, T) -> T,
    ) -> T {
        enum Visit<'a> {
            Enter(&'a ExpressionNode),
            Join(char),
        }

        let mut work = vec![Visit::Enter(self)];
        let mut done: Vec<T> = Vec::new();
        while let Some(visit) = work.pop() {
            match visit {
                Visit::Enter(Self::Leaf { name }) => done.push(leaf(name.as_str())),
                Visit::Enter(Self::Binary {
                    operator,
                    left,
                    right,
                }) => {
                    work.push(Visit::Join(*operator));
                    work.push(Visit::Enter(right.as_ref()));
                    work.push(Visit::Enter(left.as_ref()));
                }
                Visit::Join(operator) => {
                    let (Some(right), Some(left)) = (done.pop(), done.pop()) else {
                        unreachable!("both operands are folded before their join");
                    };
                    done.push(binary(operator, left, right));
                }
            }
        }
        done.pop().unwrap_or_else(|| unreachable!("the root is always folded"))
    }
}

impl Drop for ExpressionNode {
    fn drop(&mut self) {
        // detach operator children so every box is freed with leaf children only
        fn detach(node: &mut ExpressionNode, pending: &mut Vec<Box<ExpressionNode>>) {
            if let ExpressionNode::Binary { left, right, .. } = node {
                for child in [left, right] {
                    if !child.is_leaf() {
                        pending.push(std::mem::replace(
                            child,
                            Box::new(ExpressionNode::leaf(String::new())),
                        ));
                    }
                }
            }
        }

        let mut pending = Vec::new();
        detach(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach(node.as_mut(), &mut pending);
        }
    }
}

impl Clone for ExpressionNode {
    fn clone(&self) -> Self {
        self.fold(|name| Self::leaf(name), Self::binary)
    }
}

impl PartialEq for ExpressionNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Self::Leaf { name: a }, Self::Leaf { name: b }) => {
                    if a != b {
                        return false;
                    }
                }
                (
                    Self::Binary {
                        operator: op_a,
                        left: left_a,
                        right: right_a,
                    },
                    Self::Binary {
                        operator: op_b,
                        left: left_b,
                        right: right_b,
                    },
                ) => {
                    if op_a != op_b {
                        return false;
                    }
                    pending.push((right_a.as_ref(), right_b.as_ref()));
                    pending.push((left_a.as_ref(), left_b.as_ref()));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for ExpressionNode {}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Node(&'a ExpressionNode),
            Operator(char),
            Close,
        }

        let mut pending = vec![Piece::Node(self)];
        while let Some(piece) = pending.pop() {
            match piece {
                Piece::Node(Self::Leaf { name }) => f.write_str(name)?,
                Piece::Node(Self::Binary {
                    operator,
                    left,
                    right,
                }) => {
                    f.write_str("(")?;
                    pending.push(Piece::Close);
                    pending.push(Piece::Node(right.as_ref()));
                    pending.push(Piece::Operator(*operator));
                    pending.push(Piece::Node(left.as_ref()));
                }
                Piece::Operator(operator) => write!(f, " {} ", operator)?,
                Piece::Close => f.write_str(")")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { name } => write!(f, "Leaf({:?})", name),
            Self::Binary { .. } => write!(f, "Binary({})", self),
        }
    }
}

/// Serialized in its parenthesized textual form.
impl Serialize for ExpressionNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub struct PathIter<'a> {
    stack: Vec<(Path, &'a ExpressionNode)>,
}

impl<'a> Iterator for PathIter<'a> {
    type Item = (Path, &'a ExpressionNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        if let ExpressionNode::Binary { left, right, .. } = node {
            // right pushed first so left is visited first
            self.stack.push((path.child(Direction::Right), right.as_ref()));
            self.stack.push((path.child(Direction::Left), left.as_ref()));
        }
        Some((path, node))
    }
}

fn strip_highlight(text: &str) -> String {
    text.replace(HIGHLIGHT_OPEN, "")
        .replace(HIGHLIGHT_CLOSE, "")
        .trim()
        .to_string()
}

fn is_name_delimiter(c: char) -> bool {
    matches!(c, ' ' | ')' | '+' | '*')
}

/// A binary node waiting for one of its sub-expressions.
enum Frame {
    Left,
    Right { operator: char, left: ExpressionNode },
}

/// Recursive-descent parser driven by an explicit frame stack, so deeply
/// nested input cannot overflow the call stack.
struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(chars: &'a [char]) -> Self {
        Self { chars, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> ExpressionNode {
        let mut frames: Vec<Frame> = Vec::new();

        loop {
            // descend until a complete sub-expression is available
            self.skip_ws();
            let mut node = match self.peek() {
                None => ExpressionNode::leaf(EXHAUSTED),
                Some('(') => {
                    self.pos += 1;
                    frames.push(Frame::Left);
                    continue;
                }
                Some(_) => self.parse_name(),
            };

            // ascend, closing every frame the finished node completes
            loop {
                match frames.pop() {
                    None => return node,
                    Some(Frame::Left) => {
                        self.skip_ws();
                        match self.peek() {
                            Some(operator) => {
                                self.pos += 1;
                                frames.push(Frame::Right {
                                    operator,
                                    left: node,
                                });
                                break;
                            }
                            // no operator before end of input: the group is just its left side
                            None => continue,
                        }
                    }
                    Some(Frame::Right { operator, left }) => {
                        self.skip_ws();
                        if self.peek() == Some(')') {
                            self.pos += 1;
                        }
                        node = ExpressionNode::binary(operator, left, node);
                    }
                }
            }
        }
    }

    fn parse_name(&mut self) -> ExpressionNode {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '(' || is_name_delimiter(c) {
                break;
            }
            self.pos += 1;
        }

        if self.peek() == Some('(') {
            let mut depth = 0usize;
            while let Some(c) = self.peek() {
                self.pos += 1;
                match c {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }

        let token: String = self.chars[start..self.pos].iter().collect();
        let token = token.trim();
        if token.is_empty() {
            self.pos = (self.pos + 1).min(self.chars.len());
            return ExpressionNode::leaf(EMPTY_TOKEN);
        }
        ExpressionNode::leaf(token)
    }
}
