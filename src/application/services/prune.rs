//! Question pruning service
//!
//! Reads token tables, builds one tree per question and runs the pruner
//! over all of them.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{parse_sentences, PruneReport, Pruner, Question};
use crate::infrastructure::traits::FileSystem;

/// A question after pruning, with what the pipeline did to it.
#[derive(Debug)]
pub struct PrunedQuestion {
    pub question: Question,
    pub report: PruneReport,
}

/// Service for turning parser output into pruned trees.
pub struct PruneService {
    fs: Arc<dyn FileSystem>,
    pruner: Pruner,
}

impl PruneService {
    /// Create a new pruning service.
    pub fn new(fs: Arc<dyn FileSystem>, pruner: Pruner) -> Self {
        Self { fs, pruner }
    }

    /// Read a token-table file and build its questions.
    #[instrument(level = "debug", skip(self))]
    pub fn read_questions(&self, path: &Path) -> ApplicationResult<Vec<Question>> {
        let input = self.read_input(path)?;
        self.parse_questions(&input)
    }

    /// Build questions from token-table text.
    pub fn parse_questions(&self, input: &str) -> ApplicationResult<Vec<Question>> {
        let sentences = parse_sentences(input)?;
        debug!("parse_questions: {} sentences", sentences.len());

        sentences
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                Question::from_sentence(sentence).map_err(|source| ApplicationError::Question {
                    ordinal: i + 1,
                    name: sentence
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("line {}", sentence.first_line)),
                    source,
                })
            })
            .collect()
    }

    /// Prune every question independently, in parallel.
    ///
    /// Results keep input order; the first failing question aborts the batch.
    #[instrument(level = "debug", skip_all, fields(questions = questions.len()))]
    pub fn prune_all(&self, questions: Vec<Question>) -> ApplicationResult<Vec<PrunedQuestion>> {
        let results: Vec<ApplicationResult<PrunedQuestion>> = questions
            .into_par_iter()
            .enumerate()
            .map(|(i, mut question)| {
                let report = self.pruner.prune_question(&mut question).map_err(|source| {
                    ApplicationError::Question {
                        ordinal: i + 1,
                        name: question.display_name().to_string(),
                        source,
                    }
                })?;
                Ok(PrunedQuestion { question, report })
            })
            .collect();

        // Collect successes, propagate first error
        let mut pruned = Vec::with_capacity(results.len());
        for result in results {
            pruned.push(result?);
        }
        debug!("prune_all: pruned {} questions", pruned.len());
        Ok(pruned)
    }

    /// Parse and prune token-table text.
    pub fn prune_input(&self, input: &str) -> ApplicationResult<Vec<PrunedQuestion>> {
        let questions = self.parse_questions(input)?;
        self.prune_all(questions)
    }

    /// Read, parse and prune a token-table file.
    pub fn prune_file(&self, path: &Path) -> ApplicationResult<Vec<PrunedQuestion>> {
        let questions = self.read_questions(path)?;
        self.prune_all(questions)
    }

    fn read_input(&self, path: &Path) -> ApplicationResult<String> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        self.fs
            .read_to_string(path)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("read {}", path.display()),
                source: Box::new(e),
            })
    }
}
