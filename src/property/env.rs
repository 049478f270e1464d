use std::collections::BTreeMap;
use std::path::MAIN_SEPARATOR;

/// Read-only view of process-wide properties.
///
/// Two tiers are exposed: system properties, which the application sets
/// explicitly (plus a few built-ins), and environment variables. The
/// resolver only ever reads from it.
pub trait Environment: Send + Sync + std::fmt::Debug {
    fn system_property(&self, key: &str) -> Option<String>;

    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
///
/// Environment variables are read live on every lookup. System properties
/// are captured when the value is built and start out with these built-ins:
///
/// | key              | value                                 |
/// |------------------|---------------------------------------|
/// | `user.dir`       | current working directory             |
/// | `user.home`      | `HOME` (or `USERPROFILE` on Windows)  |
/// | `tmp.dir`        | [`std::env::temp_dir`]                |
/// | `os.name`        | [`std::env::consts::OS`]              |
/// | `os.arch`        | [`std::env::consts::ARCH`]            |
/// | `file.separator` | the platform path separator           |
/// | `path.separator` | `:` on Unix, `;` on Windows           |
/// | `line.separator` | `\n` on Unix, `\r\n` on Windows       |
#[derive(Debug, Clone)]
pub struct ProcessEnvironment {
    system: BTreeMap<String, String>,
}

impl Default for ProcessEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessEnvironment {
    pub fn new() -> Self {
        let mut system = BTreeMap::new();

        if let Ok(dir) = std::env::current_dir() {
            system.insert("user.dir".to_string(), dir.display().to_string());
        }
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            system.insert("user.home".to_string(), home.to_string_lossy().into_owned());
        }
        system.insert(
            "tmp.dir".to_string(),
            std::env::temp_dir().display().to_string(),
        );
        system.insert("os.name".to_string(), std::env::consts::OS.to_string());
        system.insert("os.arch".to_string(), std::env::consts::ARCH.to_string());
        system.insert("file.separator".to_string(), MAIN_SEPARATOR.to_string());
        system.insert(
            "path.separator".to_string(),
            if cfg!(windows) { ";" } else { ":" }.to_string(),
        );
        system.insert(
            "line.separator".to_string(),
            if cfg!(windows) { "\r\n" } else { "\n" }.to_string(),
        );

        Self { system }
    }

    /// Sets a system property, replacing any built-in of the same name.
    pub fn with_system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system.insert(key.into(), value.into());
        self
    }

    /// Imports prefixed environment variables as system properties.
    ///
    /// Variables are mapped to property keys by:
    /// 1. Removing the prefix and separator
    /// 2. Splitting remaining segments on the separator
    /// 3. Lowercasing the segments and joining them with `.`
    ///
    /// With prefix `MYAPP` and separator `__`, `MYAPP__CONFIG__DIR=/etc/app`
    /// becomes the system property `config.dir=/etc/app`.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_prefixed_vars(mut self, prefix: &str, separator: &str) -> Self {
        assert!(!separator.is_empty(), "separator must not be empty");
        let prefix_with_sep = format!("{prefix}{separator}");

        for (key, value) in std::env::vars() {
            let Some(path) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }

            let property = path
                .split(separator)
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(".");
            self.system.insert(property, value);
        }

        self
    }
}

impl Environment for ProcessEnvironment {
    fn system_property(&self, key: &str) -> Option<String> {
        self.system.get(key).cloned()
    }

    fn var(&self, key: &str) -> Option<String> {
        // std::env::var panics on these
        if key.is_empty() || key.contains(|c: char| c == '=' || c == '\0') {
            return None;
        }
        std::env::var(key).ok()
    }
}

/// A fixed, in-memory environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    system: BTreeMap<String, String>,
    vars: BTreeMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system.insert(key.into(), value.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn system_property(&self, key: &str) -> Option<String> {
        self.system.get(key).cloned()
    }

    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
