//! Launch configuration for the supervised server.
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::SupervisorError;

fn default_java() -> String {
    "java".into()
}

fn default_min_ram() -> String {
    "1G".into()
}

fn default_max_ram() -> String {
    "4G".into()
}

fn default_extra_args() -> String {
    "-XX:+UseG1GC -XX:+ParallelRefProcEnabled -XX:MaxGCPauseMillis=200".into()
}

fn default_nogui() -> bool {
    true
}

/// Parameters for one server launch.
///
/// A config is rebuilt (and revalidated) on every start; once a launch has
/// begun the supervisor never looks at it again.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchConfig {
    /// Path or bare command name of the Java executable.
    #[serde(default = "default_java")]
    pub java: String,
    /// Path to the server jar. Its containing directory becomes the
    /// server's working directory.
    pub jar: PathBuf,
    /// Initial JVM heap size, e.g. "1G".
    #[serde(default = "default_min_ram")]
    pub min_ram: String,
    /// Maximum JVM heap size, e.g. "4G".
    #[serde(default = "default_max_ram")]
    pub max_ram: String,
    /// Additional whitespace-separated JVM arguments.
    #[serde(default = "default_extra_args")]
    pub extra_args: String,
    /// Whether to suppress the server's interactive GUI console.
    #[serde(default = "default_nogui")]
    pub nogui: bool,
}

impl LaunchConfig {
    /// Checks that the configured paths are usable.
    ///
    /// A bare command name for `java` is accepted and left to PATH
    /// resolution at spawn time; an explicit path must exist. The jar must
    /// always be an existing file.
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.java.trim().is_empty() {
            return Err(SupervisorError::InvalidConfig(
                "java executable path is empty".into(),
            ));
        }

        let java = Path::new(&self.java);
        if java.components().count() > 1 && !java.is_file() {
            return Err(SupervisorError::InvalidConfig(format!(
                "java executable '{}' does not exist",
                self.java
            )));
        }

        if self.jar.as_os_str().is_empty() {
            return Err(SupervisorError::InvalidConfig(
                "server jar path is empty".into(),
            ));
        }

        if !self.jar.is_file() {
            return Err(SupervisorError::InvalidConfig(format!(
                "server jar '{}' does not exist",
                self.jar.display()
            )));
        }

        Ok(())
    }

    /// The directory the server must be launched from.
    ///
    /// The jar is passed to the JVM by file name only, so the jar's
    /// containing directory is where the server finds its world data.
    pub fn server_dir(&self) -> PathBuf {
        match self.jar.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// File name component of the server jar.
    pub fn jar_file_name(&self) -> String {
        self.jar
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Builds the full argument vector for launching the server, starting
    /// with the Java executable itself.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            self.java.clone(),
            format!("-Xms{}", self.min_ram),
            format!("-Xmx{}", self.max_ram),
        ];
        args.extend(self.extra_args.split_whitespace().map(str::to_string));
        args.push("-jar".into());
        args.push(self.jar_file_name());
        if self.nogui {
            args.push("--nogui".into());
        }
        args
    }
}

/// Loads and parses a launch configuration file.
pub fn load_launch_config(config_path: &str) -> Result<LaunchConfig, SupervisorError> {
    let content = fs::read_to_string(config_path).map_err(|e| {
        SupervisorError::ConfigReadError(std::io::Error::new(
            e.kind(),
            format!("{e} ({config_path})"),
        ))
    })?;

    let config: LaunchConfig =
        serde_yaml::from_str(&content).map_err(SupervisorError::ConfigParseError)?;
    Ok(config)
}
