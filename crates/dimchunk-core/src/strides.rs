use crate::{rvec, RVec, Shape};

#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Strides(RVec<usize>);

impl Strides {
    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Linear offset of a coordinate.
    pub fn offset_of(&self, coord: &[usize]) -> usize {
        self.0.iter().zip(coord).map(|(s, c)| s * c).sum()
    }
}

impl std::fmt::Debug for Strides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shape = format!("[{}", self.0.first().unwrap_or(&0));
        for dim in self.0.iter().skip(1) {
            shape.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", shape)
    }
}

impl std::ops::Index<usize> for Strides {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<&Shape> for Strides {
    fn from(shape: &Shape) -> Self {
        let mut strides = rvec![];
        let mut stride = 1;
        for size in shape.inner().iter().rev() {
            strides.push(stride);
            stride *= *size;
        }
        strides.reverse();
        Self(strides)
    }
}
