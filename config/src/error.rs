//! Errors raised while loading and validating a [`crate::Settings`].

use thiserror::Error;

/// Errors raised while reading, parsing, or validating the top-level
/// configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configured file could not be read from disk.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path that was passed to [`crate::load`].
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file's contents were not valid YAML, or did not match the
    /// expected schema.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Path that was passed to [`crate::load`].
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Neither `kafka` nor `rabbit` was configured, or both were
    ///.
    #[error("exactly one of 'kafka' or 'rabbit' must be configured, found {0}")]
    BrokerSelection(&'static str),

    /// A `siblings.<name>.controller` (or `controllers.<name>.builder` /
    /// `.interfaces` / `.apps`) value named something not present in the
    /// corresponding top-level table.
    #[error("{section} references unknown {referenced_kind} '{name}'")]
    DanglingReference {
        /// Section the dangling reference was found in, e.g.
        /// `"siblings.ci"`.
        section: String,
        /// Kind of thing that was referenced, e.g. `"controller"`.
        referenced_kind: &'static str,
        /// The unresolved name.
        name: String,
    },
}
