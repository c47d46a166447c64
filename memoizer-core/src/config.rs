//! Configuration file support for memoizer
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.memoizerrc.json` in project root
//! 3. `memoizer.config.json` in project root
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::descriptor::is_identifier;
use crate::wrapper::{WrapperSynthesizer, DEFAULT_ADAPTER};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Attribute name that tags a function for rewriting
pub const DEFAULT_MARKER: &str = "memoize";

/// Default exclude patterns applied when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/build/**",
    "**/cmake-build-*/**",
    "**/vendor/**",
    "**/third_party/**",
];

/// memoizer configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoizerConfig {
    /// Glob patterns for files to include (default: all C++ sources and headers)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for files to exclude (default: build and vendored trees)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Attribute that tags functions for rewriting (default: `memoize`)
    #[serde(default)]
    pub marker: Option<String>,

    /// Callable the generated wrappers pass the original function to (default: `memoize`)
    #[serde(default)]
    pub adapter: Option<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Compiled include patterns (empty means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Whether `exclude` came from the config rather than the defaults
    pub custom_excludes: bool,
    pub marker: String,
    pub adapter: String,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
    /// Directory patterns are matched relative to (None matches paths as given)
    pub project_root: Option<PathBuf>,
}

impl MemoizerConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref marker) = self.marker {
            validate_marker(marker).context("invalid marker")?;
        }
        if let Some(ref adapter) = self.adapter {
            validate_adapter(adapter).context("invalid adapter")?;
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        // Compile include patterns
        let include = if self.include.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.include {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };

        // User excludes replace the defaults
        let exclude = {
            let mut builder = GlobSetBuilder::new();
            if self.exclude.is_empty() {
                for pattern in DEFAULT_EXCLUDES {
                    builder.add(Glob::new(pattern)?);
                }
            } else {
                for pattern in &self.exclude {
                    builder.add(Glob::new(pattern)?);
                }
            }
            builder.build()?
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            custom_excludes: !self.exclude.is_empty(),
            marker: self
                .marker
                .clone()
                .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
            adapter: self
                .adapter
                .clone()
                .unwrap_or_else(|| DEFAULT_ADAPTER.to_string()),
            config_path: None,
            project_root: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a file path should be included based on include/exclude patterns
    ///
    /// Patterns are matched against the path relative to the project root, so
    /// `src/**/*.cpp` names the project's `src` directory.
    pub fn should_include(&self, path: &Path) -> bool {
        let relative = self.project_relative(path);
        let path_str = relative.to_string_lossy();

        // Check exclude first
        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        // If include patterns exist, file must match at least one
        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// `path` with the project root and any `.` components removed
    fn project_relative(&self, path: &Path) -> PathBuf {
        let stripped = self.project_root.as_deref().and_then(|root| {
            absolutize(path)
                .strip_prefix(root)
                .ok()
                .map(Path::to_path_buf)
        });
        stripped
            .unwrap_or_else(|| path.to_path_buf())
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        MemoizerConfig::default().resolve()
    }

    /// Replace the marker, e.g. from a CLI flag
    pub fn set_marker(&mut self, marker: &str) -> Result<()> {
        validate_marker(marker).context("invalid --marker")?;
        self.marker = marker.to_string();
        Ok(())
    }

    /// Replace the adapter, e.g. from a CLI flag
    pub fn set_adapter(&mut self, adapter: &str) -> Result<()> {
        validate_adapter(adapter).context("invalid --adapter")?;
        self.adapter = adapter.to_string();
        Ok(())
    }

    pub fn synthesizer(&self) -> WrapperSynthesizer {
        WrapperSynthesizer::new(self.adapter.as_str())
    }
}

/// Join a relative path onto the working directory
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// A marker is a single attribute name
fn validate_marker(marker: &str) -> Result<()> {
    if !is_identifier(marker) {
        anyhow::bail!("`{}` is not an attribute name", marker);
    }
    Ok(())
}

/// An adapter is an identifier, optionally namespace-qualified (`cache::memoize`, `::memoize`)
fn validate_adapter(adapter: &str) -> Result<()> {
    let unrooted = adapter.strip_prefix("::").unwrap_or(adapter);
    if unrooted.split("::").any(|segment| !is_identifier(segment)) {
        anyhow::bail!("`{}` is not a C++ function name", adapter);
    }
    Ok(())
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.memoizerrc.json`
/// 2. `memoizer.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(MemoizerConfig, PathBuf)>> {
    for name in [".memoizerrc.json", "memoizer.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<MemoizerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: MemoizerConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (MemoizerConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    resolved.project_root = Some(absolutize(project_root));
    Ok(resolved)
}
