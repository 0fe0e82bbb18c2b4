mod cast;
mod placement;
mod sbp;
mod session;

pub use cast::*;
pub use placement::*;
pub use sbp::*;
pub use session::*;

use crate::{InvalidArgument, OperationError, Shape};

#[derive(Debug, thiserror::Error)]
pub enum CastError {
    #[error("Distribute {0:?} is not valid, expected B, P or S(<axis>).")]
    InvalidSbp(String),
    #[error("{sbps} SBPs given for placement hierarchy {hierarchy:?}.")]
    HierarchyMismatch { sbps: usize, hierarchy: Shape },
    #[error("{sbps} SBPs given with {placements} placements.")]
    PlacementArity { sbps: usize, placements: usize },
    #[error("Hierarchy {hierarchy:?} does not cover {ranks} ranks.")]
    PlacementSize { ranks: usize, hierarchy: Shape },
    #[error("Rank {0} appears twice in placement.")]
    DuplicateRank(usize),
    #[error("Rank {rank} is not part of the placement.")]
    RankNotInPlacement { rank: usize },
    #[error("Split axis {axis} out of range for rank {rank} tensor.")]
    SplitAxisOutOfRange { axis: usize, rank: usize },
    #[error("Rank {rank} gets no elements when splitting {extent} along axis {axis} into {parts}.")]
    EmptyShard {
        rank: usize,
        axis: usize,
        parts: usize,
        extent: usize,
    },
    #[error("Wrong arity, expected {expected}, got {actual}.")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Consistent cast outside of a consistent scope.")]
    NotInConsistentScope,
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error(transparent)]
    OperationError(#[from] OperationError),
}
