use std::ffi::CString;
use std::fmt;
use std::slice;

use crate::errors::{Error, Result};

/// Program name followed by its arguments, in input order.
///
/// Never contains empty strings.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TokenList {
    words: Vec<String>,
}

impl TokenList {
    pub(crate) fn push<S: Into<String>>(&mut self, word: S) {
        let word = word.into();
        debug_assert!(!word.is_empty());
        self.words.push(word);
    }

    pub(crate) fn pop(&mut self) -> Option<String> {
        self.words.pop()
    }

    pub fn program(&self) -> Option<&str> {
        self.words.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&str> {
        self.words.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.words.iter()
    }

    /// Converts the words into the argument vector handed to `execvp`, which
    /// supplies the trailing null pointer itself.
    pub fn to_c_argv(&self) -> Result<Vec<CString>> {
        self.words
            .iter()
            .map(|word| CString::new(word.as_str()).map_err(|_| Error::invalid_argument(word)))
            .collect()
    }
}

impl<S: Into<String>> From<Vec<S>> for TokenList {
    fn from(words: Vec<S>) -> Self {
        let mut tokens = TokenList::default();
        for word in words {
            let word = word.into();
            if !word.is_empty() {
                tokens.push(word);
            }
        }
        tokens
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

/// One `;`-separated subcommand of an input line.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub tokens: TokenList,
    /// Set when the statement ended with the background marker, which has
    /// been removed from `tokens`.
    pub background: bool,
}

impl Statement {
    pub fn new(tokens: TokenList, background: bool) -> Self {
        Self { tokens, background }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.background {
            write!(f, "{} &", self.tokens)
        } else {
            write!(f, "{}", self.tokens)
        }
    }
}

/// Statements of one input line, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandGroup {
    pub input: String,
    pub statements: Vec<Statement>,
}

impl CommandGroup {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            statements: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_list_program_and_args() {
        let tokens = TokenList::from(vec!["ls", "-l", "/tmp"]);
        assert_eq!(tokens.program(), Some("ls"));
        assert_eq!(tokens.args(), &["-l".to_string(), "/tmp".to_string()]);
        assert_eq!(tokens.to_string(), "ls -l /tmp");
    }

    #[test]
    fn test_empty_token_list_has_no_program() {
        let tokens = TokenList::default();
        assert_eq!(tokens.program(), None);
        assert!(tokens.args().is_empty());
    }

    #[test]
    fn test_token_list_from_vec_skips_empty_words() {
        let tokens = TokenList::from(vec!["", "echo", "", "hi"]);
        assert_eq!(tokens, TokenList::from(vec!["echo", "hi"]));
    }

    #[test]
    fn test_c_argv_rejects_nul_bytes() {
        let tokens = TokenList::from(vec!["echo", "a\0b"]);
        assert!(tokens.to_c_argv().is_err());

        let tokens = TokenList::from(vec!["echo", "ab"]);
        let argv = tokens.to_c_argv().unwrap();
        assert_eq!(argv[1].as_bytes(), b"ab");
    }

    #[test]
    fn test_background_statement_display() {
        let statement = Statement::new(TokenList::from(vec!["sleep", "1"]), true);
        assert_eq!(statement.to_string(), "sleep 1 &");
    }
}
