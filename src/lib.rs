//! depprune: reduce the dependency parse of a question to its content skeleton.
//!
//! The pipeline removes punctuation, determiners, predeterminers,
//! prepositions and passive auxiliaries, folds adjectives into the noun
//! they modify, strips `Give me` / `List` boilerplate at the root and
//! finally restores reading order at every level.
//!
//! ```ignore
//! use depprune::domain::{parse_sentences, Pruner, Question};
//!
//! let sentences = parse_sentences(input)?;
//! let mut question = Question::from_sentence(&sentences[0])?;
//! let report = Pruner::default().prune_question(&mut question)?;
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use domain::{Pruner, PrunerOptions, Question, TreeArena};
