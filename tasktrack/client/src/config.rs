use crate::service::Limits;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/graphql/";
pub const DEFAULT_PROJECT_LIMIT: u32 = 50;
pub const DEFAULT_TASK_LIMIT: u32 = 100;

pub const CONFIG_FILE_NAME: &str = "tasktrack.toml";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";
const ENV_PREFIX: &str = "TASKTRACK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Cannot determine a configuration directory")]
    NoConfigDir,
}

/// Keeps development state apart from everyday use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Release,
    Dev,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Release => "tasktrack",
            Profile::Dev => "tasktrack-dev",
        }
    }

    /// Directory holding the config file and the default preferences file.
    pub fn config_dir(self) -> Option<PathBuf> {
        ProjectDirs::from("com", "tasktrack", self.app_name())
            .map(|dirs| dirs.config_dir().to_path_buf())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_project_limit")]
    pub project_limit: u32,
    #[serde(default = "default_task_limit")]
    pub task_limit: u32,
    /// Overrides the preferences file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<PathBuf>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_project_limit() -> u32 {
    DEFAULT_PROJECT_LIMIT
}

fn default_task_limit() -> u32 {
    DEFAULT_TASK_LIMIT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_limit: DEFAULT_PROJECT_LIMIT,
            task_limit: DEFAULT_TASK_LIMIT,
            preferences_path: None,
        }
    }
}

impl ClientConfig {
    /// Loads `tasktrack.toml` from the profile's config directory, if present, with
    /// `TASKTRACK_*` environment variables taking precedence.
    pub fn load(profile: Profile) -> Result<Self, ConfigError> {
        let file = profile.config_dir().map(|dir| dir.join(CONFIG_FILE_NAME));
        Self::from_sources(file.as_deref())
    }

    pub fn from_sources(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(::config::File::from(file).required(false));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn preferences_path(&self, profile: Profile) -> Result<PathBuf, ConfigError> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => profile
                .config_dir()
                .map(|dir| dir.join(PREFERENCES_FILE_NAME))
                .ok_or(ConfigError::NoConfigDir),
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            projects: self.project_limit,
            tasks: self.task_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod deser_tests {
        use super::*;

        #[test]
        fn test_config_deserialize_from_toml() {
            // Arrange
            let toml_str = r#"
                endpoint = "https://tasks.example.test/graphql/"
                project_limit = 10
                task_limit = 20
                preferences_path = "/tmp/tasktrack/preferences.json"
            "#;

            // Act
            let config: ClientConfig = toml::from_str(toml_str).unwrap();

            // Assert
            assert_eq!(config.endpoint, "https://tasks.example.test/graphql/");
            assert_eq!(config.project_limit, 10);
            assert_eq!(config.task_limit, 20);
            assert_eq!(
                config.preferences_path,
                Some(PathBuf::from("/tmp/tasktrack/preferences.json"))
            );
        }

        #[test]
        fn test_config_deserialize_empty_uses_defaults() {
            // Act
            let config: ClientConfig = toml::from_str("").unwrap();

            // Assert
            assert_eq!(config, ClientConfig::default());
            assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
            assert_eq!(config.project_limit, 50);
            assert_eq!(config.task_limit, 100);
        }
    }

    #[test]
    fn test_config_serialize_to_toml_omits_unset_path() {
        // Act
        let toml_str = toml::to_string(&ClientConfig::default()).unwrap();

        // Assert
        assert!(toml_str.contains("endpoint = \"http://localhost:8000/graphql/\""));
        assert!(toml_str.contains("project_limit = 50"));
        assert!(!toml_str.contains("preferences_path"));
    }

    #[test]
    fn test_config_file_is_read() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&file, "task_limit = 25\n").unwrap();

        // Act
        let config = ClientConfig::from_sources(Some(&file)).unwrap();

        // Assert
        assert_eq!(config.task_limit, 25);
        assert_eq!(config.project_limit, DEFAULT_PROJECT_LIMIT);
    }

    #[test]
    fn test_missing_config_file_is_not_an_error() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();

        // Act
        let config = ClientConfig::from_sources(Some(&dir.path().join(CONFIG_FILE_NAME)));

        // Assert
        assert!(config.is_ok());
    }

    #[test]
    fn test_explicit_preferences_path_wins() {
        let config = ClientConfig {
            preferences_path: Some(PathBuf::from("/tmp/prefs.json")),
            ..ClientConfig::default()
        };

        assert_eq!(
            config.preferences_path(Profile::Dev).unwrap(),
            PathBuf::from("/tmp/prefs.json")
        );
    }

    #[test]
    fn test_limits_follow_config() {
        let config = ClientConfig {
            project_limit: 5,
            task_limit: 7,
            ..ClientConfig::default()
        };

        assert_eq!(config.limits(), Limits { projects: 5, tasks: 7 });
    }

    #[test]
    fn test_profiles_use_separate_directories() {
        let release = Profile::Release.config_dir();
        let dev = Profile::Dev.config_dir();

        if let (Some(release), Some(dev)) = (release, dev) {
            assert_ne!(release, dev);
        }
    }
}
