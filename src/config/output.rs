//! Output-location settings.

use serde::{Deserialize, Serialize};

/// Where scheduled output may land when the requested folder is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent of all user home folders.
    pub home_root: String,
    /// Last-resort output folder.
    pub default_output_folder: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            home_root: "/home".into(),
            default_output_folder: None,
        }
    }
}

impl OutputConfig {
    /// Set the parent of user home folders.
    #[must_use]
    pub fn with_home_root(mut self, home_root: impl Into<String>) -> Self {
        self.home_root = home_root.into();
        self
    }

    /// Set the last-resort output folder.
    #[must_use]
    pub fn with_default_output_folder(mut self, folder: impl Into<String>) -> Self {
        self.default_output_folder = Some(folder.into());
        self
    }

    /// Home folder of `user`.
    #[must_use]
    pub fn home_folder(&self, user: &str) -> String {
        format!("{}/{user}", self.home_root.trim_end_matches('/'))
    }
}
