use crate::{OperationError, RVec, Shape};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Half-open `[start, stop)` window over one dimension.
///
/// Chunks are always contiguous, so `step` is fixed to 1. Any other step is
/// rejected by [`SliceSpec::resolve`].
#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start: usize,
    pub stop: usize,
    #[new(value = "1")]
    pub step: usize,
}

impl ChunkRange {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.stop
    }
}

impl std::fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.stop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimRange {
    /// The whole dimension.
    Full,
    Range(ChunkRange),
}

impl DimRange {
    pub fn resolve(&self, extent: usize) -> Range<usize> {
        match self {
            DimRange::Full => 0..extent,
            DimRange::Range(r) => r.as_range(),
        }
    }
}

impl std::fmt::Display for DimRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimRange::Full => write!(f, ":"),
            DimRange::Range(r) => write!(f, "{}", r),
        }
    }
}

/// # SliceSpec
///
/// Describes a view of a tensor as one [`DimRange`] per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SliceSpec(RVec<DimRange>);

impl SliceSpec {
    pub fn new(ranges: RVec<DimRange>) -> Self {
        Self(ranges)
    }

    /// Selects everything.
    pub fn full(rank: usize) -> Self {
        Self(RVec::from_elem(DimRange::Full, rank))
    }

    /// Constrains `dim` to `range` and leaves every other dimension unconstrained.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= rank`.
    pub fn along(rank: usize, dim: usize, range: ChunkRange) -> Self {
        let mut spec = Self::full(rank);
        spec.0[dim] = DimRange::Range(range);
        spec
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn ranges(&self) -> &[DimRange] {
        &self.0
    }

    pub fn get(&self, dim: usize) -> Option<&DimRange> {
        self.0.get(dim)
    }

    pub(crate) fn set(&mut self, dim: usize, range: DimRange) {
        self.0[dim] = range;
    }

    /// Concrete index ranges against `shape`, validating that every
    /// constrained range is contiguous and fits inside its dimension.
    pub fn resolve(&self, shape: &Shape) -> Result<RVec<Range<usize>>, OperationError> {
        if self.rank() != shape.rank() {
            return Err(OperationError::RankMismatch {
                expected: shape.rank(),
                actual: self.rank(),
            });
        }
        self.0
            .iter()
            .zip(shape.iter())
            .enumerate()
            .map(|(dim, (range, &extent))| {
                if let DimRange::Range(ChunkRange { step, .. }) = *range {
                    if step != 1 {
                        return Err(OperationError::UnsupportedStep { dim, step });
                    }
                }
                let r = range.resolve(extent);
                if r.start > r.end || r.end > extent {
                    return Err(OperationError::SliceOutOfBounds {
                        dim,
                        start: r.start,
                        stop: r.end,
                        extent,
                    });
                }
                Ok(r)
            })
            .collect()
    }

    /// Shape of the view this spec selects from `shape`.
    pub fn output_shape(&self, shape: &Shape) -> Result<Shape, OperationError> {
        Ok(self.resolve(shape)?.iter().map(|r| r.len()).collect())
    }
}

impl std::fmt::Display for SliceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (idx, range) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", range)?;
        }
        write!(f, "]")
    }
}
