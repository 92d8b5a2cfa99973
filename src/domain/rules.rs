//! Structural reduction rules applied by the pruner.
//!
//! Most rules are instances of one algorithm, [`remove_where`]: walk the
//! tree depth-first and splice out every node a predicate accepts. The
//! modifier fold adds a hook that runs before each splice; the
//! interrogative rule and sibling ordering work on the root and on whole
//! levels respectively.

use std::collections::{HashSet, VecDeque};

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::error::DomainResult;

pub const PUNCTUATION_TAG: &str = ".";
pub const DETERMINER_TAG: &str = "DT";
pub const PREDETERMINER_TAG: &str = "PDT";
pub const PREPOSITION_TAG: &str = "IN";
pub const PASSIVE_AUXILIARY_DEP: &str = "auxpass";
pub const ADJECTIVE_TAG: &str = "JJ";
pub const DEFAULT_NOUN_TAGS: [&str; 4] = ["NN", "NNS", "NNP", "NNPS"];

pub const GIVE_LABEL: &str = "Give";
pub const ME_LABEL: &str = "me";
pub const LIST_LABEL: &str = "List";

/// Splice-removes every node accepted by `is_match` and returns how many
/// were removed.
///
/// `on_match` runs on each accepted node while it is still attached, so it
/// can inspect the node's ancestors. The root is tested first: while it
/// matches it is replaced by its first child. Below the root the walk is
/// pre-order; after each removal the scan of the current child list starts
/// over, so children spliced into the list are tested as well.
#[instrument(level = "trace", skip_all)]
pub fn remove_where<P, H>(tree: &mut TreeArena, is_match: P, on_match: H) -> DomainResult<usize>
where
    P: Fn(&NodeData) -> bool,
    H: FnMut(&mut TreeArena, Index) -> DomainResult<()>,
{
    let mut removal = ConditionalRemoval {
        is_match,
        on_match,
        removed: 0,
    };

    while let Some(root) = tree.root() {
        if !removal.accepts(tree, root) {
            break;
        }
        removal.splice(tree, root)?;
    }
    if let Some(root) = tree.root() {
        removal.scan_children(tree, root)?;
    }

    Ok(removal.removed)
}

struct ConditionalRemoval<P, H> {
    is_match: P,
    on_match: H,
    removed: usize,
}

impl<P, H> ConditionalRemoval<P, H>
where
    P: Fn(&NodeData) -> bool,
    H: FnMut(&mut TreeArena, Index) -> DomainResult<()>,
{
    fn accepts(&self, tree: &TreeArena, idx: Index) -> bool {
        tree.data(idx).is_some_and(|data| (self.is_match)(data))
    }

    fn splice(&mut self, tree: &mut TreeArena, idx: Index) -> DomainResult<()> {
        (self.on_match)(tree, idx)?;
        if tree.remove(idx).is_some() {
            self.removed += 1;
        }
        Ok(())
    }

    fn scan_children(&mut self, tree: &mut TreeArena, node: Index) -> DomainResult<()> {
        let mut stack = vec![ScanFrame::new(node)];
        while let Some(frame) = stack.last_mut() {
            let Some(child) = tree.children(frame.node).get(frame.cursor).copied() else {
                stack.pop();
                continue;
            };
            if self.accepts(tree, child) {
                self.splice(tree, child)?;
                // spliced-in children are tested from the start of the list
                frame.cursor = 0;
                continue;
            }
            frame.cursor += 1;
            // Children already descended into stay clean across restarts
            if frame.scanned.insert(child) {
                stack.push(ScanFrame::new(child));
            }
        }
        Ok(())
    }
}

/// One level of the depth-first scan.
struct ScanFrame {
    node: Index,
    cursor: usize,
    scanned: HashSet<Index>,
}

impl ScanFrame {
    fn new(node: Index) -> Self {
        Self {
            node,
            cursor: 0,
            scanned: HashSet::new(),
        }
    }
}

/// Outcome of folding one modifier into its nearest noun ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fold {
    /// The modifier label was prepended to `target`'s label
    Merged { modifier: String, target: Index },
    /// No noun ancestor exists
    Orphaned { modifier: String, source_index: usize },
}

/// Prepends the label of `modifier` plus a space to its nearest ancestor
/// tagged with one of `noun_tags`. The modifier itself is left in place.
#[instrument(level = "trace", skip(tree, noun_tags))]
pub fn fold_into_noun_ancestor(tree: &mut TreeArena, modifier: Index, noun_tags: &[String]) -> Fold {
    let (label, source_index) = match tree.data(modifier) {
        Some(data) => (data.label.clone(), data.source_index),
        None => {
            return Fold::Orphaned {
                modifier: String::new(),
                source_index: 0,
            }
        }
    };

    let target = tree
        .ancestors(modifier)
        .find(|(_, data)| noun_tags.iter().any(|tag| *tag == data.pos_tag))
        .map(|(idx, _)| idx);

    match target.and_then(|idx| tree.get_node_mut(idx).map(|node| (idx, node))) {
        Some((idx, node)) => {
            node.data.label = format!("{} {}", label, node.data.label);
            trace!("fold: '{}' -> '{}'", label, node.data.label);
            Fold::Merged {
                modifier: label,
                target: idx,
            }
        }
        None => Fold::Orphaned {
            modifier: label,
            source_index,
        },
    }
}

/// Drops imperative question boilerplate at the root.
///
/// A `Give` root loses its `me` child (with whatever hangs below it) and is
/// then removed via root replacement; a `Give` root without `me` is left
/// alone. A `List` root is always removed. Returns the number of nodes
/// dropped.
#[instrument(level = "debug", skip(tree))]
pub fn strip_interrogative(tree: &mut TreeArena) -> usize {
    let Some(root) = tree.root() else {
        return 0;
    };
    let Some(label) = tree.data(root).map(|data| data.label.clone()) else {
        return 0;
    };

    match label.as_str() {
        GIVE_LABEL => {
            let me = tree
                .children(root)
                .iter()
                .copied()
                .find(|&child| tree.data(child).is_some_and(|data| data.label == ME_LABEL));
            match me {
                Some(me) => {
                    let dropped = tree.detach(me);
                    tree.remove(root);
                    debug!("strip_interrogative: removed 'Give me'");
                    dropped + 1
                }
                None => 0,
            }
        }
        LIST_LABEL => {
            tree.remove(root);
            debug!("strip_interrogative: removed 'List'");
            1
        }
        _ => 0,
    }
}

/// Breadth-first from the root, sorts every child list by source index.
#[instrument(level = "debug", skip(tree))]
pub fn restore_sibling_order(tree: &mut TreeArena) {
    let Some(root) = tree.root() else {
        return;
    };
    let mut queue = VecDeque::from([root]);
    while let Some(idx) = queue.pop_front() {
        tree.sort_children(idx);
        queue.extend(tree.children(idx).iter().copied());
    }
}
