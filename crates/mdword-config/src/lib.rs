//! Configuration management for mdword.
//!
//! Parses `mdword.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Tool and directory paths additionally expand a leading `~`.
//!
//! Expanded fields:
//! - `server.host`
//! - `tools.pandoc`
//! - `tools.mermaid`
//! - `output.work_dir`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override document compiler path.
    pub pandoc: Option<PathBuf>,
    /// Override diagram compiler path.
    pub mermaid: Option<PathBuf>,
    /// Override working directory for generated files.
    pub work_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdword.toml";

/// Default timeout for external compilers.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// External tool configuration (paths are raw strings from TOML).
    tools: ToolsConfigRaw,
    /// Output configuration (paths are raw strings from TOML).
    output: OutputConfigRaw,
    /// Math handling configuration.
    pub math: MathConfig,

    /// Resolved tool configuration (set after loading).
    #[serde(skip)]
    pub tools_resolved: ToolsConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5678,
        }
    }
}

/// Raw tool configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ToolsConfigRaw {
    pandoc: Option<String>,
    mermaid: Option<String>,
    timeout_secs: Option<u64>,
}

/// Resolved external tool configuration.
///
/// Bare executable names (no path separator) are kept as-is and looked up on
/// `PATH` when the toolchain is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Document compiler (pandoc) executable.
    pub pandoc: PathBuf,
    /// Diagram compiler (mermaid-cli `mmdc`) executable.
    pub mermaid: PathBuf,
    /// Timeout applied to every external compiler invocation.
    pub timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pandoc: PathBuf::from("pandoc"),
            mermaid: PathBuf::from("mmdc"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Raw output configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    work_dir: Option<String>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Directory for diagram sources, rendered images and generated documents.
    pub work_dir: PathBuf,
}

/// Math handling configuration.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct MathConfig {
    /// Wrap bare math-looking notation (Greek letters, subscripts, operators)
    /// in inline math delimiters before protection.
    pub auto_wrap: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`tools.pandoc`").
        field: String,
        /// Error message (e.g., "${`PANDOC_HOME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Resolve a tool path against the config directory.
///
/// Absolute paths and bare names are returned unchanged; anything else is
/// relative to the config file.
fn resolve_tool(value: &str, config_dir: &Path) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() || path.components().count() <= 1 {
        path
    } else {
        config_dir.join(path)
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdword.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(pandoc) = &settings.pandoc {
            self.tools_resolved.pandoc.clone_from(pandoc);
        }
        if let Some(mermaid) = &settings.mermaid {
            self.tools_resolved.mermaid.clone_from(mermaid);
        }
        if let Some(work_dir) = &settings.work_dir {
            self.output_resolved.work_dir.clone_from(work_dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            tools: ToolsConfigRaw::default(),
            output: OutputConfigRaw::default(),
            math: MathConfig::default(),
            tools_resolved: ToolsConfig::default(),
            output_resolved: OutputConfig {
                work_dir: base.join(".mdword").join("work"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_tools()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate tool configuration.
    fn validate_tools(&self) -> Result<(), ConfigError> {
        require_non_empty(
            &self.tools_resolved.pandoc.to_string_lossy(),
            "tools.pandoc",
        )?;
        require_non_empty(
            &self.tools_resolved.mermaid.to_string_lossy(),
            "tools.mermaid",
        )?;
        if self.tools_resolved.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "tools.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref pandoc) = self.tools.pandoc {
            self.tools.pandoc = Some(expand::expand_path(pandoc, "tools.pandoc")?);
        }
        if let Some(ref mermaid) = self.tools.mermaid {
            self.tools.mermaid = Some(expand::expand_path(mermaid, "tools.mermaid")?);
        }
        if let Some(ref work_dir) = self.output.work_dir {
            self.output.work_dir = Some(expand::expand_path(work_dir, "output.work_dir")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = ToolsConfig::default();
        self.tools_resolved = ToolsConfig {
            pandoc: self
                .tools
                .pandoc
                .as_deref()
                .map_or(defaults.pandoc, |p| resolve_tool(p, config_dir)),
            mermaid: self
                .tools
                .mermaid
                .as_deref()
                .map_or(defaults.mermaid, |p| resolve_tool(p, config_dir)),
            timeout: self
                .tools
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
        };

        self.output_resolved = OutputConfig {
            work_dir: config_dir.join(self.output.work_dir.as_deref().unwrap_or(".mdword/work")),
        };
    }
}
