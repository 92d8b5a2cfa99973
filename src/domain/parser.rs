//! Reader for the parser's token tables.
//!
//! Two layouts are accepted, one token per line and a blank line between
//! sentences:
//!
//! ```text
//! # id = q1
//! # text = Give me all awards.
//! 1   Give    VB   0   root
//! 2   me      PRP  1   iobj
//! ```
//!
//! and ten-column CoNLL-U, where XPOS is preferred over UPOS as the tag.

use tracing::{instrument, trace};

use crate::domain::entities::{Sentence, Token};
use crate::domain::error::{DomainError, DomainResult};

const SHORT_COLUMNS: usize = 5;
const CONLLU_COLUMNS: usize = 10;

/// Parse every sentence in `input`. Sentences without tokens are dropped.
#[instrument(level = "debug", skip(input))]
pub fn parse_sentences(input: &str) -> DomainResult<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut current = Sentence::default();

    for (offset, raw) in input.lines().enumerate() {
        let line_no = offset + 1;
        let line = raw.trim_end();

        if line.trim().is_empty() {
            flush(&mut current, &mut sentences);
            continue;
        }
        if let Some(comment) = line.trim_start().strip_prefix('#') {
            parse_comment(comment, &mut current);
            continue;
        }
        if let Some(token) = parse_token(line, line_no)? {
            if current.tokens.is_empty() {
                current.first_line = line_no;
            }
            current.tokens.push(token);
        }
    }
    flush(&mut current, &mut sentences);

    Ok(sentences)
}

/// Ends the current block. Metadata of a block without tokens is dropped.
fn flush(current: &mut Sentence, sentences: &mut Vec<Sentence>) {
    let finished = std::mem::take(current);
    if !finished.tokens.is_empty() {
        sentences.push(finished);
    }
}

fn parse_comment(comment: &str, current: &mut Sentence) {
    let Some((key, value)) = comment.split_once('=') else {
        return;
    };
    let value = value.trim().to_string();
    match key.trim() {
        "id" | "sent_id" => current.id = Some(value),
        "text" => current.text = Some(value),
        _ => {}
    }
}

/// Returns None for CoNLL-U multi-word ranges and empty nodes.
fn parse_token(line: &str, line_no: usize) -> DomainResult<Option<Token>> {
    let columns: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    let (id, form, pos_tag, head, dep_label) = match columns.len() {
        SHORT_COLUMNS => (columns[0], columns[1], columns[2], columns[3], columns[4]),
        CONLLU_COLUMNS => {
            let pos_tag = if columns[4] == "_" { columns[3] } else { columns[4] };
            (columns[0], columns[1], pos_tag, columns[6], columns[7])
        }
        n => {
            return Err(DomainError::InvalidToken {
                line: line_no,
                message: format!(
                    "expected {} or {} columns, found {}",
                    SHORT_COLUMNS, CONLLU_COLUMNS, n
                ),
            })
        }
    };

    if id.contains('-') || id.contains('.') {
        trace!("parse_token: skipping range/empty node {}", id);
        return Ok(None);
    }

    let index = parse_number(id, "id", line_no)?;
    if index == 0 {
        return Err(DomainError::InvalidToken {
            line: line_no,
            message: "token ids start at 1".into(),
        });
    }
    let head = parse_number(head, "head", line_no)?;

    Ok(Some(Token {
        index,
        form: form.to_string(),
        pos_tag: pos_tag.to_string(),
        head,
        dep_label: dep_label.to_string(),
    }))
}

fn parse_number(value: &str, column: &str, line_no: usize) -> DomainResult<usize> {
    value.parse().map_err(|_| DomainError::InvalidToken {
        line: line_no,
        message: format!("{} '{}' is not a number", column, value),
    })
}
