use thiserror::Error;

use crate::objects::{ Capability, ObjectId };

/// Broken bindings in the object graph. These surface to the author instead of
/// silently dropping content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectError {
    #[error("track domain [{min}, {max}] is empty")]
    InvalidDomain { min: f64, max: f64 },
    #[error("clone is not implemented for {0}")]
    CloneNotImplemented(&'static str),
    #[error("reference cycle through object {0}")]
    CycleDetected(ObjectId),
    #[error("object {0} does not exist")]
    UnknownObject(ObjectId),
    #[error("object {id} cannot {capability}")]
    CapabilityMissing { id: ObjectId, capability: Capability },
    #[error("object {0} is not a track")]
    NotATrack(ObjectId),
    #[error("scatter tracks are parallel")]
    ParallelTracks,
    #[error("no property `{0}` on this object")]
    NoSuchProperty(&'static str),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed dataset: {0}")]
    Parse(#[from] json::Error),
    #[error("cannot read dataset: {0}")]
    Io(#[from] std::io::Error),
}
