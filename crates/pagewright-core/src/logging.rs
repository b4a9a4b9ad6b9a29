use serde::Serialize;
use std::fmt;

/// The two verbosity levels an invocation can run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Info,
    Debug,
}

impl From<bool> for Verbosity {
    fn from(debug: bool) -> Self {
        if debug {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Debug => "debug",
        })
    }
}

/// Logging state fixed once at invocation start and handed to the stages
/// that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogContext {
    pub verbosity: Verbosity,
}

impl LogContext {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn is_debug(&self) -> bool {
        self.verbosity == Verbosity::Debug
    }
}
