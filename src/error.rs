// Host errors

use thiserror::Error;

/// Host adapter errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("A global host is already installed")]
    AlreadyInstalled,

    #[error("Component {0} may only exist once")]
    DuplicateSingleton(&'static str),
}

pub type Result<T> = std::result::Result<T, HostError>;
