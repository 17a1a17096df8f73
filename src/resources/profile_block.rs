//! Managed block inside a shell profile script.
//!
//! The block is delimited by marker comments so re-running replaces it in
//! place and leaves everything the user wrote around it untouched.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, ResourceState};

/// Opening marker line.
pub const BLOCK_BEGIN: &str = "# >>> provision >>>";
/// Closing marker line.
pub const BLOCK_END: &str = "# <<< provision <<<";

/// A marker-delimited block of lines in a profile file.
#[derive(Debug, Clone)]
pub struct ProfileBlockResource {
    /// Profile script path.
    pub path: PathBuf,
    /// Lines placed between the markers.
    pub lines: Vec<String>,
}

impl ProfileBlockResource {
    /// Create a new profile block resource.
    #[must_use]
    pub const fn new(path: PathBuf, lines: Vec<String>) -> Self {
        Self { path, lines }
    }

    fn rendered_block(&self) -> String {
        let mut block = String::from(BLOCK_BEGIN);
        block.push('\n');
        for line in &self.lines {
            block.push_str(line);
            block.push('\n');
        }
        block.push_str(BLOCK_END);
        block
    }
}

/// Text before the managed block, the block itself (markers included) and
/// the text after it.
fn split_block(content: &str) -> Option<(&str, String, &str)> {
    let (before, rest) = content.split_once(BLOCK_BEGIN)?;
    let (inner, after) = rest.split_once(BLOCK_END)?;
    Some((before, format!("{BLOCK_BEGIN}{inner}{BLOCK_END}"), after))
}

impl Resource for ProfileBlockResource {
    fn description(&self) -> String {
        format!("{} ({} lines)", self.path.display(), self.lines.len())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Missing);
        }
        if self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: "profile path is a directory".to_string(),
            });
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(match split_block(&content) {
            None => ResourceState::Missing,
            Some((_, block, _)) if block == self.rendered_block() => ResourceState::Correct,
            Some(_) => ResourceState::Incorrect {
                current: "outdated block".to_string(),
            },
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        let existing = if self.path.exists() {
            std::fs::read_to_string(&self.path)
                .with_context(|| format!("reading {}", self.path.display()))?
        } else {
            String::new()
        };
        let block = self.rendered_block();
        let updated = match split_block(&existing) {
            Some((before, _, after)) => format!("{before}{block}{after}"),
            None if existing.is_empty() => format!("{block}\n"),
            None if existing.ends_with('\n') => format!("{existing}\n{block}\n"),
            None => format!("{existing}\n\n{block}\n"),
        };
        if updated == existing {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&self.path, updated)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}
