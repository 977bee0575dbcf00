use engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActorError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("cannot check collision shapes of merged actor {0}: its members may differ")]
    MergedCollisionQuery(String),
    #[error("cannot hide or show actor {0}: it has collision shapes")]
    CollisionShapesPresent(String),
    #[error("cannot remove actor {0} from the scene during gpu simulation; move it far away instead")]
    GpuRemoval(String),
    #[error("cannot write the pose of static actor {0} in gpu simulation")]
    StaticPoseWrite(String),
    #[error("actor {0} is not dynamic")]
    NotDynamic(String),
    #[error("expected 1, {expected} or one value per body, got {got}")]
    CountMismatch { expected: usize, got: usize },
    #[error("flat pose data of length {0} is not a multiple of 7")]
    RaggedPose(usize),
    #[error("actor {0} was built for a different simulation backend")]
    BackendMismatch(String),
    #[error("an actor needs at least one entity")]
    Empty,
    #[error("cannot merge {0} actors with {1} actors")]
    MixedBodyTypes(String, String),
    #[error("sub-scene index {index} out of range for {num_envs} sub-scenes")]
    SceneIndexOutOfRange { index: usize, num_envs: usize },
    #[error("an actor named {0} already exists")]
    DuplicateName(String),
}
