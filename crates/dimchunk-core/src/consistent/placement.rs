use crate::{CastError, ChunkPlan, ChunkRange, DimRange, NdSbp, RVec, Sbp, Shape, SliceSpec};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Cuda,
}

/// # Placement
///
/// A set of process ranks arranged in an N-dimensional hierarchy.
///
/// Rank `ranks[i]` sits at the row-major coordinate `i` of `hierarchy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    device: DeviceKind,
    ranks: Vec<usize>,
    hierarchy: Shape,
}

impl Placement {
    pub fn new(device: DeviceKind, ranks: Vec<usize>, hierarchy: Shape) -> Result<Self, CastError> {
        if hierarchy.is_empty() || hierarchy.numel() != ranks.len() {
            return Err(CastError::PlacementSize {
                ranks: ranks.len(),
                hierarchy,
            });
        }
        let mut seen = ranks.clone();
        seen.sort_unstable();
        if let Some(w) = seen.windows(2).find(|w| w[0] == w[1]) {
            return Err(CastError::DuplicateRank(w[0]));
        }
        Ok(Self {
            device,
            ranks,
            hierarchy,
        })
    }

    /// One-dimensional hierarchy over `ranks`.
    pub fn flat(device: DeviceKind, ranks: Vec<usize>) -> Result<Self, CastError> {
        let hierarchy = Shape::from([ranks.len()]);
        Self::new(device, ranks, hierarchy)
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    pub fn hierarchy(&self) -> &Shape {
        &self.hierarchy
    }

    pub fn contains(&self, rank: usize) -> bool {
        self.ranks.contains(&rank)
    }

    /// Position of `rank` in the hierarchy.
    pub fn coords_of(&self, rank: usize) -> Option<RVec<usize>> {
        let mut index = self.ranks.iter().position(|&r| r == rank)?;
        let mut coords: RVec<usize> = RVec::from_elem(0, self.hierarchy.rank());
        for (axis, &parts) in self.hierarchy.iter().enumerate().rev() {
            coords[axis] = index % parts;
            index /= parts;
        }
        Some(coords)
    }

    fn check_nd_sbp(&self, nd_sbp: &NdSbp) -> Result<(), CastError> {
        if nd_sbp.len() != self.hierarchy.rank() {
            return Err(CastError::HierarchyMismatch {
                sbps: nd_sbp.len(),
                hierarchy: self.hierarchy.clone(),
            });
        }
        Ok(())
    }

    /// The region of `logical` held by `rank` under `nd_sbp`.
    ///
    /// Each split axis of the hierarchy chunks the region left by the axes
    /// before it, so `(S(0), S(0))` on a `[2, 2]` hierarchy quarters dim 0.
    pub fn local_spec(
        &self,
        logical: &Shape,
        nd_sbp: &NdSbp,
        rank: usize,
    ) -> Result<SliceSpec, CastError> {
        self.check_nd_sbp(nd_sbp)?;
        let coords = self
            .coords_of(rank)
            .ok_or(CastError::RankNotInPlacement { rank })?;

        let mut region: Vec<Range<usize>> = logical.iter().map(|&extent| 0..extent).collect();
        for ((sbp, &parts), &coord) in nd_sbp.iter().zip(self.hierarchy.iter()).zip(coords.iter()) {
            let Sbp::Split(axis) = *sbp else {
                continue;
            };
            let current = region
                .get(axis)
                .cloned()
                .ok_or(CastError::SplitAxisOutOfRange {
                    axis,
                    rank: logical.rank(),
                })?;
            let current_shape: Shape = region.iter().map(|r| r.len()).collect();
            let plan = ChunkPlan::chunk(&current_shape, axis, parts)?;
            let piece = plan
                .ranges()
                .get(coord)
                .copied()
                .ok_or(CastError::EmptyShard {
                    rank,
                    axis,
                    parts,
                    extent: current.len(),
                })?;
            region[axis] = current.start + piece.start..current.start + piece.stop;
        }

        let mut spec = SliceSpec::full(logical.rank());
        for (dim, (r, &extent)) in region.iter().zip(logical.iter()).enumerate() {
            if r.len() != extent {
                spec.set(dim, DimRange::Range(ChunkRange::new(r.start, r.end)));
            }
        }
        log::debug!(
            "rank {} holds {} of {:?} under {}",
            rank,
            spec,
            logical,
            nd_sbp
        );
        Ok(spec)
    }

    pub fn local_shape(
        &self,
        logical: &Shape,
        nd_sbp: &NdSbp,
        rank: usize,
    ) -> Result<Shape, CastError> {
        let spec = self.local_spec(logical, nd_sbp, rank)?;
        Ok(spec.output_shape(logical)?)
    }

    /// Logical shape assembled from uniformly sized local shards.
    pub fn logical_shape(&self, local: &Shape, nd_sbp: &NdSbp) -> Result<Shape, CastError> {
        self.check_nd_sbp(nd_sbp)?;
        let mut logical = local.clone();
        for (sbp, &parts) in nd_sbp.iter().zip(self.hierarchy.iter()) {
            if let Sbp::Split(axis) = *sbp {
                if axis >= logical.rank() {
                    return Err(CastError::SplitAxisOutOfRange {
                        axis,
                        rank: logical.rank(),
                    });
                }
                logical[axis] *= parts;
            }
        }
        Ok(logical)
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "placement(device={}, ranks={:?}, hierarchy={})",
            self.device, self.ranks, self.hierarchy
        )
    }
}
