//! Make-style dependency file for build-system staleness tracking.

use crate::error::{RefmanError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Render the rule `target: inputs...`, one input per continuation line.
/// Inputs are made absolute and listed once, in first-seen order.
pub fn render(target: &Path, inputs: &[PathBuf]) -> String {
    let mut out = format!("{}: \\\n", escape(target));
    let mut seen = Vec::new();
    for input in inputs {
        let input = escape(input);
        if seen.contains(&input) {
            continue;
        }
        out.push_str(&format!("    {:<93} \\\n", input));
        seen.push(input);
    }
    out
}

pub fn write(path: &Path, target: &Path, inputs: &[PathBuf]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RefmanError::io(parent, e))?;
    }
    fs::write(path, render(target, inputs)).map_err(|e| RefmanError::io(path, e))
}

fn escape(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .to_string_lossy()
        .replace('\\', "/")
        .replace(' ', "\\ ")
}
