use crate::{ChunkRange, DimRange, Enforcer, InvalidArgument, Shape, SliceSpec};
use serde::{Deserialize, Serialize};

/// # ChunkPlan
///
/// Partition of one dimension of a shape into contiguous, non-empty ranges,
/// each expressed as a [`SliceSpec`] over the full shape.
///
/// Every chunk but the last has the same size; the last one holds the
/// remainder and is never larger than the others. Plans are pure functions
/// of the shape metadata and own no tensor data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlan {
    dim: usize,
    chunk_size: usize,
    specs: Vec<SliceSpec>,
}

impl ChunkPlan {
    /// Splits `shape[dim]` into `chunks` pieces of `ceil(n / chunks)` elements.
    ///
    /// Fewer than `chunks` pieces are produced when the trailing ones would be
    /// empty, e.g. 6 elements in 4 chunks yields 3 chunks of 2.
    pub fn chunk(shape: &Shape, dim: usize, chunks: usize) -> Result<Self, InvalidArgument> {
        let chunks = Enforcer::check_chunks(chunks)?;
        let n = Enforcer::check_extent(shape, dim)?;
        let chunk_size = n.div_ceil(chunks);
        let plan = Self::build(shape, dim, n, chunk_size);
        if plan.len() < chunks {
            log::warn!(
                "chunk: {} elements along dim {} give {} chunks of {}, not the {} requested",
                n,
                dim,
                plan.len(),
                chunk_size,
                chunks
            );
        }
        Ok(plan)
    }

    /// Splits `shape[dim]` into pieces of exactly `split_size` elements, the
    /// last one taking whatever remains.
    pub fn split(shape: &Shape, dim: usize, split_size: usize) -> Result<Self, InvalidArgument> {
        let split_size = Enforcer::check_split_size(split_size)?;
        let n = Enforcer::check_extent(shape, dim)?;
        Ok(Self::build(shape, dim, n, split_size))
    }

    fn build(shape: &Shape, dim: usize, n: usize, chunk_size: usize) -> Self {
        let num_chunks = n.div_ceil(chunk_size);
        log::debug!(
            "planning {:?} along dim {}: {} chunks of {}",
            shape,
            dim,
            num_chunks,
            chunk_size
        );
        let specs = (0..num_chunks)
            .map(|i| {
                let range = ChunkRange::new(i * chunk_size, ((i + 1) * chunk_size).min(n));
                log::trace!("chunk {}: {}", i, range);
                SliceSpec::along(shape.rank(), dim, range)
            })
            .collect();
        Self {
            dim,
            chunk_size,
            specs,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Size of every chunk except possibly the last.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[SliceSpec] {
        &self.specs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SliceSpec> {
        self.specs.iter()
    }

    /// The ranges along the chunked dimension, in chunk order.
    pub fn ranges(&self) -> Vec<ChunkRange> {
        self.specs
            .iter()
            .filter_map(|spec| match spec.get(self.dim) {
                Some(DimRange::Range(r)) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.ranges().iter().map(ChunkRange::len).collect()
    }

    /// Shape of each chunk when applied to `shape`.
    pub fn output_shapes(&self, shape: &Shape) -> Vec<Shape> {
        self.sizes()
            .into_iter()
            .map(|size| {
                let mut out = shape.clone();
                out[self.dim] = size;
                out
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ChunkPlan {
    type Item = &'a SliceSpec;
    type IntoIter = std::slice::Iter<'a, SliceSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

impl IntoIterator for ChunkPlan {
    type Item = SliceSpec;
    type IntoIter = std::vec::IntoIter<SliceSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.into_iter()
    }
}
