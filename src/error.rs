//! Error taxonomy for manifest loading and generation.
//!
//! Fatal conditions are raised as `GenError` inside an `anyhow::Error` so the
//! caller keeps the context chain while tests can still match on the kind.
//! Cleanup failures travel on a separate advisory channel and never abort.
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("invalid manifest at {at}: {message}")]
    Schema { at: String, message: String },

    #[error("multiple declarations for path {path}")]
    DuplicatePath { path: String },

    #[error("invalid command {command:?}: {message}")]
    GeneratorSpec { command: String, message: String },

    #[error("generator program {} not found", path.display())]
    ProgramNotFound { path: PathBuf },

    #[error("compile error for {}:\n{diagnostic}", program.display())]
    Compile { program: PathBuf, diagnostic: String },

    #[error("generator {command:?} terminated with error {code}")]
    GeneratorExit { command: String, code: i32 },
}

impl GenError {
    pub(crate) fn schema(at: &str, message: impl Into<String>) -> Self {
        GenError::Schema {
            at: if at.is_empty() {
                "/".to_string()
            } else {
                format!("/{at}")
            },
            message: message.into(),
        }
    }
}

/// A best-effort deletion that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not remove {}: {}", self.path.display(), self.message)
    }
}

/// Return the `GenError` at the root of an `anyhow` chain, if any.
pub fn gen_error(err: &anyhow::Error) -> Option<&GenError> {
    err.chain().find_map(|cause| cause.downcast_ref::<GenError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn schema_error_renders_root_scope_as_slash() {
        let err = GenError::schema("", "expected a mapping");
        assert_eq!(err.to_string(), "invalid manifest at /: expected a mapping");
        let err = GenError::schema("sample/1.in", "bad");
        assert_eq!(err.to_string(), "invalid manifest at /sample/1.in: bad");
    }

    #[test]
    fn gen_error_is_found_below_context() {
        let err = Err::<(), _>(GenError::GeneratorExit {
            command: "gen 1".to_string(),
            code: 3,
        })
        .context("generate sample/1.in")
        .unwrap_err();
        assert!(matches!(
            gen_error(&err),
            Some(GenError::GeneratorExit { code: 3, .. })
        ));
    }
}
