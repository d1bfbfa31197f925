// Wraps the narrative in a minimal HTML page next to the charts
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shared::utils::SUMMARY_FILE;

use crate::chart::escape;

pub fn render_summary_html(text: &str) -> String {
    let body = escape(text.trim()).replace("\r\n", "\n").replace('\n', "<br>\n");
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Market Breadth Summary</title>\n</head>\n<body style=\"font-family: system-ui; padding: 12px;\">\n{}\n</body>\n</html>\n",
        body
    )
}

pub fn write_summary_html(dir: &Path, text: &str) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    fs::write(&path, render_summary_html(text)).with_context(|| format!("Failed to write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote summary");
    Ok(path)
}
