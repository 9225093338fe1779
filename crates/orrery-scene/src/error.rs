//! Error types for geometry generation and scene construction.

use thiserror::Error;

/// Rejected sphere tessellation parameters.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("sphere radius must be finite and positive, got {0}")]
    InvalidRadius(f32),

    #[error("sphere needs at least 3 sectors, got {0}")]
    TooFewSectors(u32),

    #[error("sphere needs at least 2 stacks, got {0}")]
    TooFewStacks(u32),

    /// More vertices than a `u32` index can address.
    #[error("{sectors}x{stacks} sphere exceeds the u32 index range")]
    TooManyVertices { sectors: u32, stacks: u32 },
}

/// Errors raised while building a [`Scene`](crate::Scene) from body specs.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    /// The body list was empty.
    #[error("scene has no bodies")]
    Empty,

    /// Two bodies share a name.
    #[error("duplicate body name `{0}`")]
    DuplicateBody(String),

    /// A parent name does not refer to a body declared earlier in the list.
    #[error("body `{body}` references unknown parent `{parent}`")]
    UnknownParent { body: String, parent: String },

    /// A body radius was zero, negative or not finite.
    #[error("body `{body}` has invalid radius {radius}")]
    InvalidRadius { body: String, radius: f32 },

    /// A rotation direction other than +1 or -1.
    #[error("rotation direction must be +1 or -1, got {0}")]
    InvalidRotationDirection(f32),
}
