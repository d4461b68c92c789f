//! Line splitting and tokenizing.
//!
//! A line holds `;`-separated statements that all run concurrently. Each
//! statement is a program name and its arguments separated by spaces, with an
//! optional trailing `&`.

use log::debug;

pub use self::ast::{CommandGroup, Statement, TokenList};

pub mod ast;

pub const STATEMENT_DELIMITER: char = ';';
pub const ARGUMENT_DELIMITER: char = ' ';
pub const BACKGROUND_MARKER: &str = "&";
pub const TERMINATOR_KEYWORDS: [&str; 2] = ["quit", "exit"];

/// Splits `command` on spaces. Repeated spaces never produce empty tokens.
pub fn tokenize(command: &str) -> TokenList {
    let mut tokens = TokenList::default();
    for word in command.split(ARGUMENT_DELIMITER).filter(|w| !w.is_empty()) {
        tokens.push(word);
    }
    tokens
}

/// Splits `line` into its statements.
///
/// Returns the group of statements to run and whether a terminator keyword
/// was seen. Terminator keywords are dropped from the group; the remaining
/// statements keep their input order wherever the keyword appeared.
pub fn split(line: &str) -> (CommandGroup, bool) {
    let mut group = CommandGroup::new(line.trim());
    let mut terminate = false;

    for statement in line.split(STATEMENT_DELIMITER).map(str::trim) {
        if statement.is_empty() {
            continue;
        }

        if is_terminator(statement) {
            terminate = true;
            continue;
        }

        let mut tokens = tokenize(statement);
        let background = strip_background_marker(&mut tokens);
        if tokens.is_empty() {
            // e.g. a lone "&"
            debug!("skipping statement without a program: {:?}", statement);
            continue;
        }

        group.statements.push(Statement::new(tokens, background));
    }

    debug!(
        "split {:?} into {} statement(s), terminate: {}",
        line,
        group.len(),
        terminate
    );
    (group, terminate)
}

fn is_terminator(statement: &str) -> bool {
    TERMINATOR_KEYWORDS.contains(&statement)
}

/// Removes a trailing background marker, returning whether one was present.
fn strip_background_marker(tokens: &mut TokenList) -> bool {
    if tokens.last() == Some(BACKGROUND_MARKER) {
        tokens.pop();
        true
    } else {
        false
    }
}
