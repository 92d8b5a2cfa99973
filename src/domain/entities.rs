//! Domain entities: tokens, sentences and questions.

use crate::domain::arena::TreeArena;
use crate::domain::builder::TreeBuilder;
use crate::domain::error::DomainResult;

/// One row of the parser's token table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based position in the sentence
    pub index: usize,
    /// Surface form
    pub form: String,
    /// Part-of-speech tag
    pub pos_tag: String,
    /// Index of the governing token, 0 for the root
    pub head: usize,
    /// Dependency relation to the head
    pub dep_label: String,
}

/// A block of tokens as read from input, before a tree is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    /// Value of a `# id = ...` comment
    pub id: Option<String>,
    /// Value of a `# text = ...` comment
    pub text: Option<String>,
    pub tokens: Vec<Token>,
    /// 1-based input line of the first token
    pub first_line: usize,
}

/// A natural-language question together with its dependency tree.
#[derive(Debug)]
pub struct Question {
    pub id: Option<String>,
    pub text: Option<String>,
    pub tree: TreeArena,
}

impl Question {
    /// Builds the question's tree from a parsed sentence.
    pub fn from_sentence(sentence: &Sentence) -> DomainResult<Self> {
        let tree = TreeBuilder::new().build(&sentence.tokens)?;
        Ok(Self {
            id: sentence.id.clone(),
            text: sentence.text.clone(),
            tree,
        })
    }

    /// Identifier for messages: the id, else the text, else a placeholder.
    pub fn display_name(&self) -> &str {
        self.id
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
///
/// Returns the input unchanged if expansion fails.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
