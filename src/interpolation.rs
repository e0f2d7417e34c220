//! Macro interpolation
//!
//! dbt macros under `dbt/macros/*.sql` may contain directive lines such as
//!
//! ```text
//! !!python/udfs/normalize_phone.py!!
//! ```
//!
//! Each directive line is replaced in place by the full contents of the named
//! file, resolved relative to the repository root. Replaced lines no longer
//! start with the marker, so running the interpolator again before the
//! templates are reverted changes nothing.

use crate::error::WorkflowError;
use std::path::{Path, PathBuf};

/// Literal prefix that marks a directive line.
pub const DIRECTIVE_MARKER: &str = "!!";

const TEMPLATE_EXTENSION: &str = "sql";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InterpolationReport {
    pub templates_scanned: usize,
    pub templates_rewritten: usize,
    pub directives_replaced: usize,
}

/// The referenced path of a directive line, or `None` for ordinary lines.
pub fn directive_source(line: &str) -> Option<&str> {
    if line.starts_with(DIRECTIVE_MARKER) {
        Some(line.trim().trim_matches('!'))
    } else {
        None
    }
}

/// Interpolate every template directly inside `macros_dir`. A missing
/// directory is an empty template set.
///
/// Fails on the first unreadable source; templates already rewritten stay
/// rewritten and are expected to be reverted by the caller.
pub async fn interpolate_macros(macros_dir: &Path, repository_root: &Path) -> Result<InterpolationReport, WorkflowError> {
    let mut report = InterpolationReport::default();

    for template in list_templates(macros_dir).await? {
        report.templates_scanned += 1;
        let content = tokio::fs::read_to_string(&template)
            .await
            .map_err(WorkflowError::io(&template))?;

        let (rewritten, replaced) = splice_directives(&template, &content, repository_root).await?;
        if replaced == 0 {
            continue;
        }

        tokio::fs::write(&template, rewritten)
            .await
            .map_err(WorkflowError::io(&template))?;
        tracing::debug!(template = %template.display(), directives = replaced, "Interpolated macro");
        report.templates_rewritten += 1;
        report.directives_replaced += replaced;
    }

    tracing::info!(
        scanned = report.templates_scanned,
        rewritten = report.templates_rewritten,
        directives = report.directives_replaced,
        "Macro interpolation finished"
    );
    Ok(report)
}

/// Templates directly inside `macros_dir` holding at least one directive,
/// in name order. Nothing is modified.
pub async fn templates_with_directives(macros_dir: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
    let mut found = Vec::new();
    for template in list_templates(macros_dir).await? {
        let content = tokio::fs::read_to_string(&template)
            .await
            .map_err(WorkflowError::io(&template))?;
        if content.lines().any(|line| directive_source(line).is_some()) {
            found.push(template);
        }
    }
    Ok(found)
}

async fn list_templates(macros_dir: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
    let mut entries = match tokio::fs::read_dir(macros_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(WorkflowError::io(macros_dir)(e)),
    };

    let mut templates = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(WorkflowError::io(macros_dir))? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(WorkflowError::io(&path))?
            .is_file();
        if is_file && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION) {
            templates.push(path);
        }
    }
    templates.sort();
    Ok(templates)
}

/// Returns the rewritten template and how many directive lines were replaced.
async fn splice_directives(template: &Path, content: &str, repository_root: &Path) -> Result<(String, usize), WorkflowError> {
    let mut out = String::with_capacity(content.len());
    let mut replaced = 0;

    for line in content.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        let Some(source) = directive_source(body) else {
            out.push_str(line);
            continue;
        };

        let source_path = repository_root.join(source);
        let snippet = tokio::fs::read_to_string(&source_path)
            .await
            .map_err(|source| WorkflowError::MissingInterpolationSource {
                template: template.to_path_buf(),
                source_path: source_path.clone(),
                source,
            })?;
        out.push_str(&snippet);
        out.push_str(terminator);
        replaced += 1;
    }

    Ok((out, replaced))
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
