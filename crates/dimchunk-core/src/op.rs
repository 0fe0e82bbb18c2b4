use crate::{ChunkPlan, InvalidArgument, Shape, SliceSpec};

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error("Rank mismatch, expected {expected}, got {actual}.")]
    RankMismatch { expected: usize, actual: usize },
    #[error("Shape mismatch at dim {dim}, {a} != {b}.")]
    ShapeMismatch { dim: usize, a: usize, b: usize },
    #[error("Slice {start}:{stop} out of bounds for dim {dim} of extent {extent}.")]
    SliceOutOfBounds {
        dim: usize,
        start: usize,
        stop: usize,
        extent: usize,
    },
    #[error("Data length {actual} does not match shape {shape:?} ({expected} elements).")]
    DataLength {
        shape: Shape,
        expected: usize,
        actual: usize,
    },
    #[error("Step {step} on dim {dim} is not supported, chunks are contiguous.")]
    UnsupportedStep { dim: usize, step: usize },
    #[error("Nothing to concatenate.")]
    EmptyInputs,
}

/// # Materialize
///
/// Anything that can produce a view of itself from a [`SliceSpec`].
///
/// Planning never touches tensor memory; implementors decide whether a view
/// shares or copies storage.
pub trait Materialize {
    type View;

    fn shape(&self) -> &Shape;

    fn slice(&self, spec: &SliceSpec) -> Result<Self::View, OperationError>;

    /// Materializes every spec of `plan`, in chunk order.
    fn apply_plan(&self, plan: &ChunkPlan) -> Result<Vec<Self::View>, OperationError> {
        plan.iter().map(|spec| self.slice(spec)).collect()
    }
}

/// Splits `src` into at most `chunks` views along `dim`.
///
/// `dim` may be negative, counting from the last dimension.
pub fn chunk<M: Materialize + ?Sized>(
    src: &M,
    chunks: usize,
    dim: isize,
) -> Result<Vec<M::View>, OperationError> {
    let shape = src.shape();
    let dim = shape.resolve_dim(dim)?;
    let plan = ChunkPlan::chunk(shape, dim, chunks)?;
    src.apply_plan(&plan)
}

/// Splits `src` into views of `split_size` along `dim`, the last holding the remainder.
pub fn split<M: Materialize + ?Sized>(
    src: &M,
    split_size: usize,
    dim: isize,
) -> Result<Vec<M::View>, OperationError> {
    let shape = src.shape();
    let dim = shape.resolve_dim(dim)?;
    let plan = ChunkPlan::split(shape, dim, split_size)?;
    src.apply_plan(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;

    /// Records the output shape of each requested view.
    struct ShapeOnly(Shape);

    impl Materialize for ShapeOnly {
        type View = Shape;

        fn shape(&self) -> &Shape {
            &self.0
        }

        fn slice(&self, spec: &SliceSpec) -> Result<Shape, OperationError> {
            spec.output_shape(&self.0)
        }
    }

    #[test]
    fn test_chunk_shapes() {
        let src = ShapeOnly(shape![5, 3, 6, 9]);
        let out = chunk(&src, 3, 2).unwrap();
        assert_eq!(out, vec![shape![5, 3, 2, 9]; 3]);

        let out = chunk(&src, 4, -1).unwrap();
        assert_eq!(out, vec![shape![5, 3, 6, 3]; 3]);
    }

    #[test]
    fn test_split_shapes() {
        let src = ShapeOnly(shape![7, 2]);
        let out = split(&src, 3, 0).unwrap();
        assert_eq!(out, vec![shape![3, 2], shape![3, 2], shape![1, 2]]);
    }

    #[test]
    fn test_chunk_invalid_dim() {
        let src = ShapeOnly(shape![5, 3, 6, 9]);
        let err = chunk(&src, 2, 5).unwrap_err();
        assert!(matches!(
            err,
            OperationError::InvalidArgument(InvalidArgument::DimOutOfRange { dim: 5, rank: 4 })
        ));
        let err = chunk(&src, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            OperationError::InvalidArgument(InvalidArgument::ZeroChunks)
        ));
    }
}
