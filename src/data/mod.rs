//! Core data model for the projects facade
//!
//! This module contains the normalized project record served to clients and
//! the upstream client that produces it.

pub mod github;

pub use github::{FetchError, GithubClient, ProjectSource};

use serde::{Deserialize, Serialize};

/// Language value used when a repository has no primary language
pub const LANG_NONE: &str = "None";

/// A public repository, normalized for the portfolio frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Repository name
    pub title: String,
    /// Four-digit creation year
    pub year: String,
    /// Stargazer count
    pub stars: u64,
    /// Primary language name, or `"None"`
    pub lang: String,
    /// Repository URL
    pub link: String,
}
