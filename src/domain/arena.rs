//! Arena-backed mutable parse tree.
//!
//! Nodes live in a generational arena owned by [`TreeArena`]; parents and
//! children refer to each other by [`Index`], so the up-links never own
//! anything. The root is a slot on the tree, not a property of a node,
//! which makes root replacement a plain re-designation.

use std::collections::HashSet;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};

/// Annotations attached to every token of a parsed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Surface text, rewritten when modifiers are folded into it
    pub label: String,
    /// Part-of-speech tag, e.g. `NN`, `JJ`, `DT`
    pub pos_tag: String,
    /// Incoming dependency relation, e.g. `auxpass`
    pub dep_label: String,
    /// Position in the original token sequence
    pub source_index: usize,
}

impl NodeData {
    pub fn new(
        label: impl Into<String>,
        pos_tag: impl Into<String>,
        dep_label: impl Into<String>,
        source_index: usize,
    ) -> Self {
        Self {
            label: label.into(),
            pos_tag: pos_tag.into(),
            dep_label: dep_label.into(),
            source_index,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}|{}|{})",
            self.label, self.source_index, self.pos_tag, self.dep_label
        )
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Token annotations for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in reading order
    pub children: Vec<Index>,
}

/// Arena-based tree holding one parsed question.
///
/// An empty tree (`root() == None`) is a valid state: it is what remains
/// after the last node has been removed.
#[derive(Debug, Clone)]
pub struct TreeArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for empty trees
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Inserts a node as the last child of `parent`, or as the root when
    /// `parent` is None.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn data(&self, idx: Index) -> Option<&NodeData> {
        self.arena.get(idx).map(|node| &node.data)
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.arena.get(idx).and_then(|node| node.parent)
    }

    /// Children of `idx` in their current order; empty for unknown indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Pre-order, left-to-right traversal from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Strict ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: Index) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            next: self.parent(idx),
        }
    }

    /// Labels in pre-order.
    pub fn labels(&self) -> Vec<String> {
        self.iter().map(|(_, node)| node.data.label.clone()).collect()
    }

    /// Splice-removes `idx` and returns its data.
    ///
    /// A non-root node is replaced, at its position among its siblings, by
    /// its own children in their current order. Removing the root promotes
    /// its first child to root and appends the remaining children, in
    /// order, after the new root's existing children. Removing a childless
    /// root leaves the tree empty.
    ///
    /// Returns None if `idx` is not a live node.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, idx: Index) -> Option<NodeData> {
        let TreeNode {
            data,
            parent,
            children,
        } = self.arena.remove(idx)?;
        trace!("remove: {}", data);

        match parent {
            Some(parent_idx) => {
                for &child in &children {
                    if let Some(child) = self.arena.get_mut(child) {
                        child.parent = Some(parent_idx);
                    }
                }
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    if let Some(pos) = parent.children.iter().position(|&c| c == idx) {
                        parent.children.splice(pos..=pos, children);
                    }
                }
            }
            None => {
                let mut orphans = children.into_iter();
                let new_root = orphans.next();
                if let Some(new_root) = new_root {
                    let orphans: Vec<Index> = orphans.collect();
                    for &orphan in &orphans {
                        if let Some(orphan) = self.arena.get_mut(orphan) {
                            orphan.parent = Some(new_root);
                        }
                    }
                    if let Some(node) = self.arena.get_mut(new_root) {
                        node.parent = None;
                        node.children.extend(orphans);
                    }
                }
                if self.root == Some(idx) {
                    self.root = new_root;
                }
            }
        }

        Some(data)
    }

    /// Removes `idx` together with its whole subtree, without promoting
    /// anything. Returns the number of nodes dropped.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: Index) -> usize {
        let Some(parent) = self.arena.get(idx).map(|node| node.parent) else {
            return 0;
        };
        match parent {
            Some(parent_idx) => {
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    parent.children.retain(|&c| c != idx);
                }
            }
            None => {
                if self.root == Some(idx) {
                    self.root = None;
                }
            }
        }

        let mut dropped = 0;
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                trace!("detach: {}", node.data);
                stack.extend(node.children);
                dropped += 1;
            }
        }
        dropped
    }

    /// Reorders the immediate children of `idx` by ascending source index.
    pub fn sort_children(&mut self, idx: Index) {
        let Some(mut children) = self.arena.get(idx).map(|node| node.children.clone()) else {
            return;
        };
        children.sort_by_key(|&child| {
            self.data(child)
                .map(|data| data.source_index)
                .unwrap_or(usize::MAX)
        });
        if let Some(node) = self.arena.get_mut(idx) {
            node.children = children;
        }
    }

    /// Number of levels, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(Index, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((idx, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(self.children(idx).iter().map(|&child| (child, level + 1)));
        }
        deepest
    }

    /// Number of nodes in the subtree rooted at `idx`, 0 for unknown indices.
    pub fn subtree_size(&self, idx: Index) -> usize {
        if self.arena.get(idx).is_none() {
            return 0;
        }
        let mut count = 0;
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children(current));
        }
        count
    }

    /// Labels of all childless nodes, left to right.
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.label.clone())
            .collect()
    }

    /// Checks the structural invariants: a single parentless root, parent
    /// links that agree with child lists, no cycles and no unreachable
    /// nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> DomainResult<()> {
        let Some(root) = self.root else {
            if self.arena.is_empty() {
                return Ok(());
            }
            return Err(DomainError::MalformedTree(format!(
                "{} nodes but no root",
                self.arena.len()
            )));
        };

        let root_node = self
            .arena
            .get(root)
            .ok_or_else(|| DomainError::MalformedTree("root is not a live node".into()))?;
        if root_node.parent.is_some() {
            return Err(DomainError::MalformedTree(format!(
                "root '{}' has a parent",
                root_node.data.label
            )));
        }

        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                return Err(DomainError::MalformedTree(
                    "node reached twice (cycle or shared child)".into(),
                ));
            }
            let node = self
                .arena
                .get(current)
                .ok_or_else(|| DomainError::MalformedTree("dangling child index".into()))?;
            for &child in &node.children {
                let child_node = self
                    .arena
                    .get(child)
                    .ok_or_else(|| DomainError::MalformedTree("dangling child index".into()))?;
                if child_node.parent != Some(current) {
                    return Err(DomainError::MalformedTree(format!(
                        "'{}' is listed under '{}' but points elsewhere",
                        child_node.data.label, node.data.label
                    )));
                }
                stack.push(child);
            }
        }

        if visited.len() != self.arena.len() {
            return Err(DomainError::MalformedTree(format!(
                "{} nodes unreachable from root",
                self.arena.len() - visited.len()
            )));
        }
        Ok(())
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.arena.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct Ancestors<'a> {
    arena: &'a TreeArena,
    next: Option<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (Index, &'a NodeData);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let node = self.arena.get_node(current)?;
        self.next = node.parent;
        Some((current, &node.data))
    }
}
