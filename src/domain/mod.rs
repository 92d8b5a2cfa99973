//! Domain layer: parse trees and the pruning rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod parser;
pub mod pruner;
pub mod rules;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::TreeBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use parser::parse_sentences;
pub use pruner::{
    EmptyTreePolicy, OrphanModifierPolicy, PruneReport, Pruner, PrunerOptions, Stage, StageReport,
};
