use engine::EngineError;
use structs::ActorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error(transparent)]
    Actor(#[from] ActorError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("unknown environment id {0}")]
    UnknownEnv(String),
    #[error("expected {expected} action rows, got {got}")]
    ActionRows { expected: usize, got: usize },
    #[error("expected actions of width {expected}, got {got}")]
    ActionWidth { expected: usize, got: usize },
}
