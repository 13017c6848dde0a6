use std::path::{Path, PathBuf};

use macaque_interpreter::{ContextOptions, Object, RunError, Session};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Runs the script at `path` and prints its value unless it is null.
pub fn execute(path: &Path, options: ContextOptions) -> Result<(), ScriptError> {
    let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_owned(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "running script");

    let mut session = Session::new(options);
    let value = session.run(&source)?;
    if !matches!(value.as_ref(), Object::Null) {
        println!("{}", value);
    }
    Ok(())
}
