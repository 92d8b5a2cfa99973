/*
Rendering of parse trees for logs and terminal output.

termtree does the drawing; TreeArena only has to be converted into its
recursive Tree<String> shape.
 */
use std::collections::HashMap;
use std::fmt;

use generational_arena::Index;
use termtree::Tree;

use crate::domain::arena::TreeArena;

pub const EMPTY_TREE: &str = "<empty>";

/// Levels drawn before the rest of a branch is summarised.
pub const MAX_RENDER_DEPTH: usize = 256;

/// How much of a node to print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelStyle {
    /// Surface label only
    #[default]
    Plain,
    /// `label (source_index|POS|deprel)`
    Tagged,
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String> {
        self.to_tree_string_with(LabelStyle::Plain)
    }

    fn to_tree_string_with(&self, style: LabelStyle) -> Tree<String>;
}

impl TreeNodeConvert for TreeArena {
    fn to_tree_string_with(&self, style: LabelStyle) -> Tree<String> {
        let text = |idx: Index| match (self.data(idx), style) {
            (Some(data), LabelStyle::Plain) => data.label.clone(),
            (Some(data), LabelStyle::Tagged) => data.to_string(),
            (None, _) => String::from("?"),
        };

        let Some(root) = self.root() else {
            return Tree::new(EMPTY_TREE.to_string());
        };

        // Pre-order puts every parent before its children, so walking it
        // backwards finishes each subtree before its parent needs it.
        let mut order = Vec::new();
        let mut stack = vec![(root, 1)];
        while let Some((idx, level)) = stack.pop() {
            order.push((idx, level));
            if level < MAX_RENDER_DEPTH {
                stack.extend(self.children(idx).iter().rev().map(|&c| (c, level + 1)));
            }
        }

        let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(order.len());
        for &(idx, level) in order.iter().rev() {
            let leaves: Vec<Tree<String>> = if level < MAX_RENDER_DEPTH {
                self.children(idx)
                    .iter()
                    .filter_map(|child| built.remove(child))
                    .collect()
            } else {
                let hidden = self.subtree_size(idx) - 1;
                if hidden == 0 {
                    Vec::new()
                } else {
                    vec![Tree::new(format!("... {hidden} more"))]
                }
            };
            built.insert(idx, Tree::new(text(idx)).with_leaves(leaves));
        }
        built
            .remove(&root)
            .unwrap_or_else(|| Tree::new(EMPTY_TREE.to_string()))
    }
}

impl fmt::Display for TreeArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tree_string_with(LabelStyle::Tagged))
    }
}
