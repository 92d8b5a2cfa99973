//! The pruning pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::Question;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::rules::{self, Fold};

/// What happens to an adjective that has no noun above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanModifierPolicy {
    /// Remove the node and drop its label
    #[default]
    Discard,
    /// Fail with [`DomainError::NoTargetAncestor`], leaving the tree
    /// partially pruned
    Reject,
}

/// What happens when pruning removes every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTreePolicy {
    /// Return the empty tree
    #[default]
    Allow,
    /// Fail with [`DomainError::EmptyResult`]
    Reject,
}

impl FromStr for OrphanModifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown orphan modifier policy: {other}")),
        }
    }
}

impl FromStr for EmptyTreePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown empty tree policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunerOptions {
    pub orphan_modifier: OrphanModifierPolicy,
    pub empty_tree: EmptyTreePolicy,
    /// Tags a modifier may be folded into
    pub noun_tags: Vec<String>,
    /// Check tree invariants before the first stage
    pub validate_input: bool,
}

impl Default for PrunerOptions {
    fn default() -> Self {
        Self {
            orphan_modifier: OrphanModifierPolicy::default(),
            empty_tree: EmptyTreePolicy::default(),
            noun_tags: rules::DEFAULT_NOUN_TAGS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            validate_input: true,
        }
    }
}

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Punctuation,
    Determiner,
    Predeterminer,
    Preposition,
    PassiveAuxiliary,
    ModifierFold,
    Interrogative,
    SiblingOrder,
}

impl Stage {
    pub const PIPELINE: [Stage; 8] = [
        Stage::Punctuation,
        Stage::Determiner,
        Stage::Predeterminer,
        Stage::Preposition,
        Stage::PassiveAuxiliary,
        Stage::ModifierFold,
        Stage::Interrogative,
        Stage::SiblingOrder,
    ];

    /// Node predicate for stages built on conditional removal.
    pub fn predicate(self) -> Option<fn(&NodeData) -> bool> {
        match self {
            Stage::Punctuation => Some(|data: &NodeData| data.pos_tag == rules::PUNCTUATION_TAG),
            Stage::Determiner => Some(|data: &NodeData| data.pos_tag == rules::DETERMINER_TAG),
            Stage::Predeterminer => Some(|data: &NodeData| data.pos_tag == rules::PREDETERMINER_TAG),
            Stage::Preposition => Some(|data: &NodeData| data.pos_tag == rules::PREPOSITION_TAG),
            Stage::PassiveAuxiliary => Some(|data: &NodeData| data.dep_label == rules::PASSIVE_AUXILIARY_DEP),
            Stage::ModifierFold => Some(|data: &NodeData| data.pos_tag == rules::ADJECTIVE_TAG),
            Stage::Interrogative | Stage::SiblingOrder => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Punctuation => "punctuation",
            Stage::Determiner => "determiner",
            Stage::Predeterminer => "predeterminer",
            Stage::Preposition => "preposition",
            Stage::PassiveAuxiliary => "passive-auxiliary",
            Stage::ModifierFold => "modifier-fold",
            Stage::Interrogative => "interrogative",
            Stage::SiblingOrder => "sibling-order",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nodes removed by one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub removed: usize,
}

/// Summary of one `prune` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub stages: Vec<StageReport>,
    /// `(modifier, resulting label)` for every successful fold
    pub merged_modifiers: Vec<(String, String)>,
    /// Modifier labels dropped for lack of a noun ancestor
    pub discarded_modifiers: Vec<String>,
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub depth_before: usize,
    pub depth_after: usize,
}

impl PruneReport {
    pub fn removed(&self, stage: Stage) -> usize {
        self.stages
            .iter()
            .filter(|report| report.stage == stage)
            .map(|report| report.removed)
            .sum()
    }

    pub fn is_empty_result(&self) -> bool {
        self.nodes_after == 0
    }
}

/// Stateless rule engine; one instance can prune any number of trees.
#[derive(Debug, Clone, Default)]
pub struct Pruner {
    options: PrunerOptions,
}

impl Pruner {
    pub fn new(options: PrunerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PrunerOptions {
        &self.options
    }

    pub fn prune_question(&self, question: &mut Question) -> DomainResult<PruneReport> {
        debug!("prune_question: {}", question.display_name());
        self.prune(&mut question.tree)
    }

    /// Runs every stage in order, mutating `tree` in place.
    ///
    /// Stages are not transactional: on error `tree` keeps whatever the
    /// earlier stages, and the failing stage up to the failing node, already
    /// did. Under [`OrphanModifierPolicy::Reject`] that includes modifiers
    /// folded before the orphan was reached. Prune a copy if the input must
    /// survive a rejection.
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn prune(&self, tree: &mut TreeArena) -> DomainResult<PruneReport> {
        if self.options.validate_input {
            tree.validate()?;
        }
        info!("before pruning:\n{}", tree);

        let mut report = PruneReport {
            nodes_before: tree.len(),
            depth_before: tree.depth(),
            ..PruneReport::default()
        };
        for stage in Stage::PIPELINE {
            let removed = self.run_stage(stage, tree, &mut report)?;
            debug!("stage {}: removed {}", stage, removed);
            report.stages.push(StageReport { stage, removed });
        }
        report.nodes_after = tree.len();
        report.depth_after = tree.depth();

        info!("after pruning:\n{}", tree);
        if tree.is_empty() {
            if self.options.empty_tree == EmptyTreePolicy::Reject {
                return Err(DomainError::EmptyResult);
            }
            warn!("pruning left an empty tree");
        }
        Ok(report)
    }

    fn run_stage(
        &self,
        stage: Stage,
        tree: &mut TreeArena,
        report: &mut PruneReport,
    ) -> DomainResult<usize> {
        match stage {
            Stage::ModifierFold => self.fold_modifiers(tree, report),
            Stage::Interrogative => Ok(rules::strip_interrogative(tree)),
            Stage::SiblingOrder => {
                rules::restore_sibling_order(tree);
                Ok(0)
            }
            _ => match stage.predicate() {
                Some(predicate) => rules::remove_where(tree, predicate, |_, _| Ok(())),
                None => Ok(0),
            },
        }
    }

    fn fold_modifiers(&self, tree: &mut TreeArena, report: &mut PruneReport) -> DomainResult<usize> {
        let Some(predicate) = Stage::ModifierFold.predicate() else {
            return Ok(0);
        };
        let noun_tags = &self.options.noun_tags;
        let policy = self.options.orphan_modifier;

        rules::remove_where(tree, predicate, |tree: &mut TreeArena, idx| {
            match rules::fold_into_noun_ancestor(tree, idx, noun_tags) {
                Fold::Merged { modifier, target } => {
                    let merged = tree
                        .data(target)
                        .map(|data| data.label.clone())
                        .unwrap_or_default();
                    report.merged_modifiers.push((modifier, merged));
                }
                Fold::Orphaned {
                    modifier,
                    source_index,
                } => match policy {
                    OrphanModifierPolicy::Discard => {
                        warn!("no noun ancestor for '{}', dropping it", modifier);
                        report.discarded_modifiers.push(modifier);
                    }
                    OrphanModifierPolicy::Reject => {
                        return Err(DomainError::NoTargetAncestor {
                            label: modifier,
                            source_index,
                        });
                    }
                },
            }
            Ok(())
        })
    }
}
