/*
Terminal tree display for expression trees via termtree.

Internal nodes show their operator, leaves their name. Children are tagged with
the edge they hang off (`L:` / `R:`). A highlighted node is wrapped in the same
`[[ ]]` marker the run logs use.

Display stops at `MAX_DISPLAY_DEPTH` levels; a deeper subtree collapses into a
single `…` entry with its node count. termtree nests trees in `Vec`s and walks
them recursively, so the bound also bounds its call depth.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::{Direction, ExpressionNode, Path};

/// Deepest level shown by the terminal tree; the root is level 1.
pub const MAX_DISPLAY_DEPTH: usize = 64;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String> {
        self.to_tree_highlighted(None)
    }

    fn to_tree_highlighted(&self, highlight: Option<&Path>) -> Tree<String>;
}

impl TreeNodeConvert for ExpressionNode {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_highlighted(&self, highlight: Option<&Path>) -> Tree<String> {
        fn label(node: &ExpressionNode) -> String {
            match node {
                ExpressionNode::Leaf { name } => name.clone(),
                ExpressionNode::Binary { operator, .. } => operator.to_string(),
            }
        }

        fn build(
            node: &ExpressionNode,
            path: &Path,
            edge: Option<Direction>,
            highlight: Option<&Path>,
        ) -> Tree<String> {
            let mut text = label(node);
            if highlight == Some(path) {
                text = format!("[[{}]]", text);
            }
            if let Some(d) = edge {
                text = format!("{}: {}", char::from(d), text);
            }

            let mut tree = Tree::new(text);
            if let ExpressionNode::Binary { left, right, .. } = node {
                if path.len() + 1 >= MAX_DISPLAY_DEPTH {
                    tree.push(Tree::new(format!("… {} more nodes", node.node_count() - 1)));
                    return tree;
                }
                for (child, d) in [(left, Direction::Left), (right, Direction::Right)] {
                    tree.push(build(child, &path.child(d), Some(d), highlight));
                }
            }
            tree
        }

        build(self, &Path::root(), None, highlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tree_string_marks_highlight() {
        let node = ExpressionNode::parse("((A + B) * C)");
        let rendered = node
            .to_tree_highlighted(Some(&Path::parse("LR")))
            .to_string();
        assert!(rendered.starts_with("*\n"));
        assert!(rendered.contains("L: +"));
        assert!(rendered.contains("R: [[B]]"));
        assert!(rendered.contains("R: C"));
    }

    #[test]
    fn test_deep_tree_is_cut_at_display_depth() {
        let depth = 10_000;
        let text = format!("{}A{}", "(".repeat(depth), " + B)".repeat(depth));
        let node = ExpressionNode::parse(&text);

        let rendered = node.to_tree_string().to_string();

        let hidden = 2 * (depth - MAX_DISPLAY_DEPTH + 1);
        assert!(rendered.contains(&format!("… {} more nodes", hidden)));
        // shown operators, right leaves above the cut, and the marker
        assert_eq!(rendered.lines().count(), 2 * MAX_DISPLAY_DEPTH);
    }

    #[test]
    fn test_leaf_tree() {
        let node = ExpressionNode::leaf("RBF1");
        assert_eq!(node.to_tree_string().to_string().trim_end(), "RBF1");
    }
}
