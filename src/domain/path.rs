//! Node addressing: `L`/`R` paths from the root of an expression tree.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Textual name of the empty path.
pub const ROOT: &str = "root";

/// One step down the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    /// Any other character; never resolves against a tree.
    Other(char),
}

impl From<char> for Direction {
    fn from(c: char) -> Self {
        match c {
            'L' => Direction::Left,
            'R' => Direction::Right,
            other => Direction::Other(other),
        }
    }
}

impl From<Direction> for char {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Other(c) => c,
        }
    }
}

/// Sequence of directions from the root; empty means the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Direction>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a sever-path string. `"root"` and `""` are the root; every other
    /// character becomes one direction, unvalidated.
    pub fn parse(text: &str) -> Self {
        if text == ROOT || text.is_empty() {
            return Self::root();
        }
        Self(text.chars().map(Direction::from).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Direction> {
        self.0.iter()
    }

    /// Path to the child of this node in `direction`.
    pub fn child(&self, direction: Direction) -> Self {
        let mut directions = self.0.clone();
        directions.push(direction);
        Self(directions)
    }

    /// Textual form; the inverse of [`Path::parse`].
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<Vec<Direction>> for Path {
    fn from(directions: Vec<Direction>) -> Self {
        Self(directions)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{}", ROOT);
        }
        for d in &self.0 {
            write!(f, "{}", char::from(*d))?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
