use std::fmt;
use std::path::PathBuf;

/// Conditions that end a QA run early. They are carried inside `anyhow::Error` and picked
/// back out by the top-level handler to print the operator-facing message.
#[derive(Debug)]
pub enum QaError {
    ConfigMissing {
        path: PathBuf,
    },
    ConnectivityFailure {
        rin: String,
        exit_code: i32,
    },
    IncompleteTest {
        expected: usize,
        found: usize,
        archived: Option<PathBuf>,
    },
}

impl fmt::Display for QaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QaError::ConfigMissing { path } => {
                write!(f, "USERNAME NOT FOUND ({})", path.display())
            }
            QaError::ConnectivityFailure { rin, exit_code } => write!(
                f,
                "UNABLE TO CONNECT TO {rin} / CONNECTION TERMINATED. (exit code {exit_code})"
            ),
            QaError::IncompleteTest {
                expected, found, ..
            } => write!(
                f,
                "TEST DID NOT COMPLETE.  PLEASE RETEST. ({found} of {expected} results)"
            ),
        }
    }
}

impl std::error::Error for QaError {}
