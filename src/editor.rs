use std::fmt;

use failure::Fail;
use log::debug;
use rustyline::{self, error::ReadlineError, Config};

use crate::errors::{ErrorKind, Result};

/// Line reader for the interactive shell, with a bounded in-memory history.
pub struct Editor {
    internal: rustyline::Editor<()>,
    history_capacity: usize,
}

impl Editor {
    pub fn with_capacity(history_capacity: usize) -> Editor {
        let config = Config::builder()
            .max_history_size(history_capacity)
            .history_ignore_space(true)
            .history_ignore_dups(true)
            .auto_add_history(false)
            .build();

        Editor {
            internal: rustyline::Editor::with_config(config),
            history_capacity,
        }
    }

    /// Reads one line, returning `None` when end of file is reached.
    ///
    /// An interrupted read (Ctrl-C) yields an empty line.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => {
                debug!("readline interrupted, discarding line");
                Ok(Some(String::new()))
            }
            Err(ReadlineError::Io(e)) => Err(e.context(ErrorKind::Io).into()),
            Err(ReadlineError::Errno(e)) => Err(e.context(ErrorKind::Io).into()),
            Err(e) => {
                debug!("readline failed: {}", e);
                Err(ErrorKind::Readline.into())
            }
        }
    }

    pub fn add_history_entry(&mut self, line: &str) {
        if self.history_capacity > 0 {
            self.internal.add_history_entry(line);
        }
    }

    pub fn history_len(&self) -> usize {
        self.internal.history().len()
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Editor {{ history: {}/{} }}",
            self.history_len(),
            self.history_capacity
        )
    }
}
