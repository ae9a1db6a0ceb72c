//! External compiler discovery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mdword_config::ToolsConfig;

/// External tool that could not be located.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// Executable not found at the configured path or on `PATH`.
    #[error("{tool} not found: {}", path.display())]
    Missing {
        /// Tool label (`pandoc` or `mermaid`).
        tool: &'static str,
        /// Configured path or name.
        path: PathBuf,
    },
}

/// Resolved external compilers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Document compiler executable.
    pub pandoc: PathBuf,
    /// Diagram compiler executable.
    pub mermaid: PathBuf,
    /// Timeout for every invocation.
    pub timeout: Duration,
}

impl Toolchain {
    /// Locate both compilers, failing on the first one missing.
    ///
    /// # Errors
    ///
    /// Returns [`ToolchainError::Missing`] naming the tool that was not found.
    pub fn resolve(tools: &ToolsConfig) -> Result<Self, ToolchainError> {
        let pandoc = locate(&tools.pandoc).ok_or_else(|| ToolchainError::Missing {
            tool: "pandoc",
            path: tools.pandoc.clone(),
        })?;
        let mermaid = locate(&tools.mermaid).ok_or_else(|| ToolchainError::Missing {
            tool: "mermaid",
            path: tools.mermaid.clone(),
        })?;

        tracing::debug!(
            pandoc = %pandoc.display(),
            mermaid = %mermaid.display(),
            "Toolchain resolved"
        );

        Ok(Self {
            pandoc,
            mermaid,
            timeout: tools.timeout,
        })
    }

    /// Use the configured paths without checking that they exist.
    ///
    /// Missing tools then surface as spawn errors at conversion time.
    #[must_use]
    pub fn unchecked(tools: &ToolsConfig) -> Self {
        Self {
            pandoc: tools.pandoc.clone(),
            mermaid: tools.mermaid.clone(),
            timeout: tools.timeout,
        }
    }

    /// Report which compilers are present, without failing.
    #[must_use]
    pub fn probe(tools: &ToolsConfig) -> ToolAvailability {
        ToolAvailability {
            pandoc: locate(&tools.pandoc),
            mermaid: locate(&tools.mermaid),
        }
    }
}

/// Presence of each external compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    /// Located document compiler.
    pub pandoc: Option<PathBuf>,
    /// Located diagram compiler.
    pub mermaid: Option<PathBuf>,
}

impl ToolAvailability {
    /// Whether the document compiler was found.
    #[must_use]
    pub fn pandoc_available(&self) -> bool {
        self.pandoc.is_some()
    }

    /// Whether the diagram compiler was found.
    #[must_use]
    pub fn mermaid_available(&self) -> bool {
        self.mermaid.is_some()
    }

    /// Whether both compilers were found.
    #[must_use]
    pub fn all_available(&self) -> bool {
        self.pandoc_available() && self.mermaid_available()
    }
}

/// Find an executable.
///
/// Paths with a directory component must point at an existing file; bare
/// names are searched on `PATH`.
fn locate(program: &Path) -> Option<PathBuf> {
    locate_in(program, std::env::var_os("PATH").as_deref())
}

fn locate_in(program: &Path, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }

    std::env::split_paths(path_var?).find_map(|dir| {
        candidates(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// File names to try for a bare program name.
fn candidates(program: &Path) -> Vec<PathBuf> {
    let mut names = vec![program.to_path_buf()];
    if cfg!(windows) && program.extension().is_none() {
        for ext in ["exe", "cmd", "bat"] {
            names.push(program.with_extension(ext));
        }
    }
    names
}
