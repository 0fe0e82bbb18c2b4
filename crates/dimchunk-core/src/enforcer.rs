use crate::Shape;

/// Caller supplied a dimension, count or shape the planner cannot honour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("Dimension out of range (expected to be in range of [-{rank}, {rank}), but got {dim}).")]
    DimOutOfRange { dim: isize, rank: usize },
    #[error("chunk expects `chunks` to be greater than 0, got 0.")]
    ZeroChunks,
    #[error("split expects `split_size` to be greater than 0, got 0.")]
    ZeroSplitSize,
    #[error("chunk expects at least a 1-dimensional tensor, dimension {dim} has extent 0.")]
    EmptyDim { dim: usize },
    #[error("Malformed shape {0:?}.")]
    MalformedShape(String),
}

/// # Enforcer
///
/// Enforcer enforces the preconditions of dimension planning.
pub struct Enforcer;

impl Enforcer {
    pub fn check_dim(shape: &Shape, dim: usize) -> Result<usize, InvalidArgument> {
        if dim >= shape.rank() {
            return Err(InvalidArgument::DimOutOfRange {
                dim: dim as isize,
                rank: shape.rank(),
            });
        }
        Ok(dim)
    }

    pub fn check_chunks(chunks: usize) -> Result<usize, InvalidArgument> {
        if chunks == 0 {
            return Err(InvalidArgument::ZeroChunks);
        }
        Ok(chunks)
    }

    pub fn check_split_size(split_size: usize) -> Result<usize, InvalidArgument> {
        if split_size == 0 {
            return Err(InvalidArgument::ZeroSplitSize);
        }
        Ok(split_size)
    }

    /// Returns the extent of `dim`, which must be non-empty.
    pub fn check_extent(shape: &Shape, dim: usize) -> Result<usize, InvalidArgument> {
        let extent = shape[Self::check_dim(shape, dim)?];
        if extent == 0 {
            return Err(InvalidArgument::EmptyDim { dim });
        }
        Ok(extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;

    #[test]
    fn test_check_extent() {
        let shape = shape![5, 0, 6];
        assert_eq!(Enforcer::check_extent(&shape, 2), Ok(6));
        assert_eq!(
            Enforcer::check_extent(&shape, 1),
            Err(InvalidArgument::EmptyDim { dim: 1 })
        );
        assert_eq!(
            Enforcer::check_extent(&shape, 3),
            Err(InvalidArgument::DimOutOfRange { dim: 3, rank: 3 })
        );
    }

    #[test]
    fn test_check_counts() {
        assert_eq!(Enforcer::check_chunks(0), Err(InvalidArgument::ZeroChunks));
        assert_eq!(Enforcer::check_chunks(3), Ok(3));
        assert_eq!(
            Enforcer::check_split_size(0),
            Err(InvalidArgument::ZeroSplitSize)
        );
    }
}
