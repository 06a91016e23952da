//! Free-text comments placed on a canvas.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A comment: unescaped atoms with a position and an optional width.
///
/// A `";"` atom marks a line break written as an escaped semicolon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    position: Option<Point>,
    atoms: Vec<String>,
    #[serde(default)]
    border: Option<u32>,
}

impl Comment {
    pub fn new(position: Option<Point>, atoms: Vec<String>) -> Self {
        Self {
            position,
            atoms,
            border: None,
        }
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = Some(position);
    }

    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn border(&self) -> Option<u32> {
        self.border
    }

    pub fn set_border(&mut self, border: u32) {
        self.border = Some(border);
    }

    /// The comment text split into its rows.
    pub fn rows(&self) -> Vec<String> {
        self.atoms
            .split(|atom| atom == ";")
            .map(|row| row.join(" "))
            .filter(|row| !row.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_rows() {
        let atoms = ["first", "line", ";", "second", ";"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let comment = Comment::new(None, atoms);
        assert_eq!(comment.rows(), vec!["first line", "second"]);
    }
}
