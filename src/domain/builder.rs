//! Tree builder turning a head-indexed token table into a [`TreeArena`].

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::Token;
use crate::domain::error::{DomainError, DomainResult};

/// Constructs dependency trees from token tables.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    /// head index -> dependents, ascending
    relationship_cache: BTreeMap<usize, Vec<usize>>,
    visited: HashSet<usize>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree whose root is the token with head 0.
    ///
    /// Children are inserted in ascending token order, so the result is
    /// already in reading order.
    #[instrument(level = "debug", skip(self, tokens), fields(tokens = tokens.len()))]
    pub fn build(&mut self, tokens: &[Token]) -> DomainResult<TreeArena> {
        self.relationship_cache.clear();
        self.visited.clear();

        let mut by_index: HashMap<usize, &Token> = HashMap::with_capacity(tokens.len());
        for token in tokens {
            if by_index.insert(token.index, token).is_some() {
                return Err(DomainError::DuplicateIndex(token.index));
            }
        }

        let mut root = None;
        for token in tokens {
            if token.head == 0 {
                if let Some(first) = root {
                    return Err(DomainError::MultipleRoots {
                        first,
                        second: token.index,
                    });
                }
                root = Some(token.index);
            } else if !by_index.contains_key(&token.head) {
                return Err(DomainError::DanglingHead {
                    index: token.index,
                    head: token.head,
                });
            } else {
                self.relationship_cache
                    .entry(token.head)
                    .or_default()
                    .push(token.index);
            }
        }
        let root = root.ok_or(DomainError::MissingRoot)?;
        for dependents in self.relationship_cache.values_mut() {
            dependents.sort_unstable();
        }

        let mut tree = TreeArena::new();
        let mut stack = vec![(root, None)];
        while let Some((current, parent_idx)) = stack.pop() {
            if !self.visited.insert(current) {
                return Err(DomainError::CycleDetected(current));
            }
            let token = by_index[&current];
            let data = NodeData::new(
                token.form.clone(),
                token.pos_tag.clone(),
                token.dep_label.clone(),
                token.index,
            );
            let current_idx = tree.insert_node(data, parent_idx);

            // Reverse push so dependents pop, and get appended, in ascending order
            if let Some(dependents) = self.relationship_cache.get(&current) {
                for &dependent in dependents.iter().rev() {
                    stack.push((dependent, Some(current_idx)));
                }
            }
        }

        // Tokens never reached from the root hang off a cycle among themselves
        if let Some(stray) = tokens
            .iter()
            .map(|t| t.index)
            .filter(|index| !self.visited.contains(index))
            .min()
        {
            return Err(DomainError::CycleDetected(stray));
        }

        debug!("build: {} nodes", tree.len());
        Ok(tree)
    }
}
