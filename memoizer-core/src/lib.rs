//! memoizer core library - cache-backed rewriting of tagged C++ functions

// Global invariants enforced in this crate:
// - Rewriting is strictly per function; one failure never affects another function
// - Every edit position refers to the original, unmodified buffer
// - No global mutable state
// - Deterministic traversal order must be explicit
// - Identical input yields byte-for-byte identical output

pub mod config;
pub mod descriptor;
pub mod edit;
pub mod error;
pub mod language;
pub mod plan;
pub mod prototype;
pub mod rename;
pub mod report;
pub mod sequencer;
pub mod symbols;
pub mod wrapper;

pub use config::ResolvedConfig;
pub use descriptor::{FunctionDescriptor, MatchedFunction, Parameter};
pub use edit::{apply_edits, EditError, TextEdit};
pub use error::{FunctionFailure, RewriteError};
pub use report::{render_json, render_source, render_text, sort_reports, FileReport};
pub use sequencer::{rewrite_descriptors, EditSequencer, UnitRewrite};
pub use wrapper::WrapperSynthesizer;

use anyhow::{Context, Result};
use language::{CppParser, LanguageParser};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Rewrite one C++ source text
///
/// `filename` is only used in messages.
pub fn rewrite_source(source: &str, filename: &str, config: &ResolvedConfig) -> Result<UnitRewrite> {
    let parser = CppParser::new()?;
    let unit = parser.parse(source, filename)?;
    if unit.has_syntax_errors() {
        debug!(file = filename, "source has syntax errors; tagged definitions containing them are rejected");
    }

    let candidates = unit.discover_functions(&config.marker);
    let symbols = unit.symbols();
    let synthesizer = config.synthesizer();

    let rewrite = EditSequencer::new(source, &symbols, &synthesizer)
        .run(candidates)
        .with_context(|| format!("Failed to apply edits to {}", filename))?;

    debug!(
        file = filename,
        rewritten = rewrite.rewritten.len(),
        failed = rewrite.failures.len(),
        "rewrote unit"
    );
    Ok(rewrite)
}

/// Rewrite one file without touching it on disk
pub fn rewrite_file(path: &Path, config: &ResolvedConfig) -> Result<FileReport> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file = path.display().to_string();
    let rewrite = rewrite_source(&source, &file, config)?;
    Ok(FileReport::new(file, rewrite))
}

/// Rewrite every included source file at the given path (file or directory)
///
/// Files are processed in parallel. Reports are returned sorted by path.
/// Files that cannot be read or parsed are logged and skipped.
pub fn rewrite_path(path: &Path, config: &ResolvedConfig) -> Result<Vec<FileReport>> {
    let source_files: Vec<PathBuf> = collect_source_files(path)?
        .into_iter()
        .filter(|file| config.should_include(file))
        .collect();

    let results: Vec<(PathBuf, Result<FileReport>)> = source_files
        .into_par_iter()
        .map(|file| {
            let result = rewrite_file(&file, config);
            (file, result)
        })
        .collect();

    let mut reports = Vec::with_capacity(results.len());
    let mut skipped_files: usize = 0;
    for (file, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!(file = %file.display(), "skipping file: {:#}", e);
                skipped_files += 1;
            }
        }
    }
    if skipped_files > 0 {
        warn!("Skipped {} file(s) due to errors", skipped_files);
    }

    Ok(sort_reports(reports))
}

/// Write a report's rewritten source back to its file
///
/// Returns `false` without touching the file when nothing was rewritten.
pub fn write_patched(report: &FileReport) -> Result<bool> {
    if !report.is_changed() {
        return Ok(false);
    }
    std::fs::write(&report.file, &report.patched)
        .with_context(|| format!("Failed to write file: {}", report.file))?;
    debug!(file = %report.file, edits = report.edits.len(), "wrote rewritten file");
    Ok(true)
}

/// Collect all supported source files from a path (file or directory)
///
/// Supported extensions are listed in [`language::CPP_EXTENSIONS`].
fn collect_source_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if language::is_supported_path(path) {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        collect_source_files_recursive(path, &mut files)?;
    } else {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    // Sort files for deterministic order
    files.sort();

    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.')
        || name.starts_with("cmake-build-")
        || name == "build"
        || name == "out"
        || name == "target"
        || name == "CMakeFiles"
}

/// Process one directory entry, pushing source files or recursing into dirs
fn process_dir_entry(path: PathBuf, metadata: std::fs::Metadata, files: &mut Vec<PathBuf>) -> Result<()> {
    if metadata.is_symlink() {
        return Ok(());
    }

    if metadata.is_dir() {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if is_skipped_dir(name) {
                return Ok(());
            }
        }
        collect_source_files_recursive(&path, files)?;
    } else if metadata.is_file() && language::is_supported_path(&path) {
        files.push(path);
    }

    Ok(())
}

/// Recursively collect supported source files from a directory
fn collect_source_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry_result in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        process_dir_entry(path, metadata, files)?;
    }

    Ok(())
}
