use thiserror::Error;

/// Library error type for slider operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured image list is empty.
    #[error("no images configured for the slider")]
    EmptyPlaylist,

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
