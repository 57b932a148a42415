//! Output-path templating.
//!
//! A scheduled run names its artifact with a path pattern such as
//! `/home/joe/reports/sales.*`. [`OutputPathResolver::resolve`] splits it into
//! directory and file name without touching any storage;
//! [`OutputPathResolver::resolve_output_file_path`] then checks the directory
//! against the repository and falls back to locations the user may write to.

use tracing::{debug, warn};

use super::error::{InvalidPathError, OutputPathError};
use super::services::{AuthorizationPolicy, Repository, SCHEDULABLE_KEY, SCHEDULER_ACTION_NAME};
use crate::config::OutputConfig;

/// Path separator of repository paths.
pub const SEPARATOR: char = '/';

/// Trailing file-name wildcard replaced by the real extension.
pub const WILDCARD_SUFFIX: &str = ".*";

/// An output-path pattern split into its parts, for one acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPathResolver {
    file_name: String,
    directory: String,
    acting_user: String,
}

impl OutputPathResolver {
    /// Split `pattern` at its last separator.
    ///
    /// `directory` keeps the separator (`"/a/b/c.*"` gives `"/a/b/"`) and
    /// `file_name` is the final segment, wildcard included.
    ///
    /// # Errors
    ///
    /// [`InvalidPathError`] if `pattern` contains no separator.
    pub fn resolve(pattern: &str, acting_user: &str) -> Result<Self, InvalidPathError> {
        let idx = pattern.rfind(SEPARATOR).ok_or_else(|| InvalidPathError {
            pattern: pattern.to_owned(),
        })?;
        let (directory, file_name) = pattern.split_at(idx + SEPARATOR.len_utf8());
        Ok(Self {
            file_name: file_name.to_owned(),
            directory: directory.to_owned(),
            acting_user: acting_user.to_owned(),
        })
    }

    /// Final path segment, unexpanded.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Everything up to and including the last separator.
    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// User the output is resolved for.
    #[must_use]
    pub fn acting_user(&self) -> &str {
        &self.acting_user
    }

    /// Pick the directory the artifact will be written to and return the
    /// full output path pattern.
    ///
    /// Candidates, in order: the requested directory, the acting user's home
    /// folder, the configured default output folder. A candidate qualifies if
    /// the user may schedule output, the folder exists, and its
    /// `schedulable` metadata is not `false`.
    ///
    /// # Errors
    ///
    /// [`OutputPathError::NoSchedulableLocation`] if no candidate qualifies.
    pub fn resolve_output_file_path(
        &self,
        repository: &dyn Repository,
        authorization: &dyn AuthorizationPolicy,
        config: &OutputConfig,
    ) -> Result<String, OutputPathError> {
        let requested = trim_directory(&self.directory);
        let home = config.home_folder(&self.acting_user);
        let candidates = std::iter::once(requested.to_owned())
            .chain(std::iter::once(home))
            .chain(config.default_output_folder.clone());

        for directory in candidates {
            if is_valid_output_directory(repository, authorization, &directory) {
                if directory != requested {
                    warn!(
                        requested = requested,
                        fallback = %directory,
                        user = %self.acting_user,
                        "Requested output folder is not schedulable; using fallback"
                    );
                }
                return Ok(join(&directory, &self.file_name));
            }
        }

        Err(OutputPathError::NoSchedulableLocation {
            requested: format!("{}{}", self.directory, self.file_name),
            user: self.acting_user.clone(),
        })
    }
}

/// Everything before the last separator, without it:
/// `"/a/b/c.txt"` gives `"/a/b"`. A path with no separator is returned as is.
#[must_use]
pub fn parent_directory(path: &str) -> &str {
    path.rfind(SEPARATOR).map_or(path, |idx| &path[..idx])
}

/// Replace a trailing `.*` in `path` with `.{extension}`, or drop it when
/// there is no extension. Paths without the wildcard are returned unchanged.
#[must_use]
pub fn expand_wildcard(path: &str, extension: Option<&str>) -> String {
    match path.strip_suffix(WILDCARD_SUFFIX) {
        Some(stem) => match extension.map(|e| e.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => format!("{stem}.{ext}"),
            _ => stem.to_owned(),
        },
        None => path.to_owned(),
    }
}

fn trim_directory(directory: &str) -> &str {
    let trimmed = directory.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() && directory.starts_with(SEPARATOR) {
        "/"
    } else {
        trimmed
    }
}

fn join(directory: &str, file_name: &str) -> String {
    if directory.ends_with(SEPARATOR) {
        format!("{directory}{file_name}")
    } else {
        format!("{directory}{SEPARATOR}{file_name}")
    }
}

fn is_valid_output_directory(
    repository: &dyn Repository,
    authorization: &dyn AuthorizationPolicy,
    directory: &str,
) -> bool {
    if !authorization.is_allowed(SCHEDULER_ACTION_NAME) {
        debug!(directory, "User lacks scheduling capability");
        return false;
    }
    let folder = match repository.get_file(directory) {
        Ok(Some(file)) if file.is_folder() => file,
        Ok(_) => return false,
        Err(e) => {
            debug!(directory, error = %e, "Output folder lookup failed");
            return false;
        }
    };
    match repository.get_file_metadata(&folder.id) {
        Ok(metadata) => metadata
            .get(SCHEDULABLE_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true),
        Err(e) => {
            debug!(directory, error = %e, "Output folder metadata lookup failed");
            false
        }
    }
}
