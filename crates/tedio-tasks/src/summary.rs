//! One-line record of the task ids a run processed.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Error;

/// Written to the current working directory by the `completed_tasks` demo.
pub const COMPLETED_TASKS_FILE: &str = "completed_tasks.log";

/// `IDs for tasks done: 0, 1, 2`
pub fn summary_line(ids: &[usize]) -> String {
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    format!("IDs for tasks done: {}", ids.join(", "))
}

/// Overwrites `path` with the summary line for `ids`.
pub fn write_summary(path: impl AsRef<Path>, ids: &[usize]) -> Result<(), Error> {
    let path = path.as_ref();
    fs::write(path, summary_line(ids)).map_err(|source| Error::Summary {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), tasks = ids.len(), "summary written");
    Ok(())
}

pub fn read_summary(path: impl AsRef<Path>) -> Result<String, Error> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| Error::Summary {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ids_comma_separated() {
        assert_eq!(summary_line(&[0, 1, 2]), "IDs for tasks done: 0, 1, 2");
        assert_eq!(summary_line(&[]), "IDs for tasks done: ");
    }
}
