//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn invalid_argument<T: AsRef<str>>(argument: T) -> Error {
        Error::from(ErrorKind::InvalidArgument(argument.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ctx.cause() {
            Some(cause) => write!(f, "{}: {}", self.ctx, cause),
            None => fmt::Display::fmt(&self.ctx, f),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The shell could not be duplicated to run `command`.
    Spawn(String),
    /// An argument cannot be passed to exec, e.g. it contains a NUL byte.
    InvalidArgument(String),
    /// Checking the status of the process with this pid failed.
    Wait(i32),
    BatchFile(String),
    Io,
    Nix,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::Spawn(ref command) => write!(f, "{}: unable to spawn process", command),
            ErrorKind::InvalidArgument(ref arg) => write!(f, "{:?}: invalid argument", arg),
            ErrorKind::Wait(pid) => write!(f, "unable to wait for process {}", pid),
            ErrorKind::BatchFile(ref path) => write!(f, "{}: unable to open batch file", path),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
