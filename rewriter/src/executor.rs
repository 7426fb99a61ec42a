use std::path::Path;

use codespan_reporting::diagnostic::{Diagnostic, Label};

use docfix::{Block, Document};

use crate::error::RewriteError;
use crate::recipe::Recipe;

/// Whether [`commit`] may touch the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    DryRun,
}

/// A non-fatal finding; the run still completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    /// 0-based origin line in the source file.
    pub line: usize,
}

impl Warning {
    pub fn to_diagnostic(&self, source: &Document, file_id: usize) -> Diagnostic<usize> {
        Diagnostic::warning()
            .with_message(&self.message)
            .with_labels(vec![Label::primary(file_id, source.line_span(self.line))])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Duplicate blocks removed, as line ranges of the source file.
    pub removed: Vec<Block>,
    /// Origin line of the block whose section was replaced.
    pub rewritten: Option<usize>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct Rewrite {
    pub document: Document,
    pub report: Report,
}

/// Result of [`commit`].
#[derive(Debug, Clone)]
pub struct Outcome {
    pub report: Report,
    /// Rendered text after the rewrite.
    pub output: String,
    pub changed: bool,
    pub written: bool,
}

/// Run both passes of `recipe` over `source`.
///
/// A document without the marker comes back unchanged. A block without the
/// section start is left as it is, with a warning.
pub fn apply(recipe: &Recipe, source: &Document) -> Result<Rewrite, RewriteError> {
    let delimiters = recipe.delimiters();
    let (filtered, removed) = source.without_duplicates(&delimiters)?;

    let mut report = Report {
        removed,
        ..Report::default()
    };

    let Some(block) = filtered.find_block(&delimiters, 0)? else {
        tracing::debug!(marker = %recipe.marker, "marker not found, nothing to rewrite");
        return Ok(Rewrite {
            document: filtered,
            report,
        });
    };

    let origin = filtered.lines()[block.start].origin;
    if filtered
        .find_within(&block, &recipe.section_start, block.start)
        .is_none()
    {
        let warning = Warning {
            message: format!(
                "block has no `{}` line, section left unchanged",
                recipe.section_start
            ),
            line: origin,
        };
        tracing::warn!(line = origin + 1, "{}", warning.message);
        report.warnings.push(warning);
        return Ok(Rewrite {
            document: filtered,
            report,
        });
    }

    let document = filtered.replace_inner(
        &block,
        &recipe.section_start,
        &recipe.section_end,
        &recipe.replacement,
    )?;
    report.rewritten = Some(origin);

    Ok(Rewrite { document, report })
}

pub fn read_source(path: &Path) -> Result<String, RewriteError> {
    std::fs::read_to_string(path).map_err(|source| RewriteError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Render `rewrite` and, in [`Mode::Write`], overwrite `path` with it.
///
/// The file is only written when the rendered text differs from `source`.
pub fn commit(
    path: &Path,
    source: &str,
    rewrite: Rewrite,
    mode: Mode,
) -> Result<Outcome, RewriteError> {
    let output = rewrite.document.render();
    let changed = output != source;
    let written = changed && mode == Mode::Write;

    if written {
        std::fs::write(path, &output).map_err(|source| RewriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            removed = rewrite.report.removed.len(),
            rewritten = rewrite.report.rewritten.is_some(),
            "file rewritten"
        );
    } else {
        tracing::debug!(path = %path.display(), changed, "file not written");
    }

    Ok(Outcome {
        report: rewrite.report,
        output,
        changed,
        written,
    })
}

/// Read `path`, apply `recipe`, and commit the result.
pub fn rewrite_file(path: &Path, recipe: &Recipe, mode: Mode) -> Result<Outcome, RewriteError> {
    let source = read_source(path)?;
    let rewrite = apply(recipe, &Document::parse(&source))?;
    commit(path, &source, rewrite, mode)
}
