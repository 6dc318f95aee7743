use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("provider '{0}' is already registered")]
    DuplicateProvider(String),

    #[error("no provider named '{0}'")]
    UnknownProvider(String),

    #[error("item '{0}' has nothing to execute")]
    EmptyCommand(String),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
