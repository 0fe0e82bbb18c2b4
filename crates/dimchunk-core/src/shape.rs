use crate::{InvalidArgument, RVec};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(RVec<usize>);

impl Shape {
    pub fn new(shape: RVec<usize>) -> Self {
        Self(shape)
    }

    pub fn inner(&self) -> &RVec<usize> {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&usize> {
        self.0.get(index)
    }

    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rank(&self) -> usize {
        self.len()
    }

    pub fn push(&mut self, dim: usize) {
        self.0.push(dim);
    }

    /// Maps a possibly negative axis onto `0..rank`.
    ///
    /// Negative values count from the back, so `-1` is the last dimension.
    pub fn resolve_dim(&self, dim: isize) -> Result<usize, InvalidArgument> {
        let rank = self.rank();
        let resolved = if dim < 0 {
            dim.checked_add(rank as isize)
        } else {
            Some(dim)
        };
        match resolved {
            Some(d) if d >= 0 && (d as usize) < rank => Ok(d as usize),
            _ => Err(InvalidArgument::DimOutOfRange { dim, rank }),
        }
    }

    /// Number of elements in one step along `dim`, i.e. the product of
    /// every trailing extent.
    pub fn block_size(&self, dim: usize) -> usize {
        self.0.iter().skip(dim + 1).product()
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shape = format!("[{}", self.0.first().unwrap_or(&0));
        for dim in self.0.iter().skip(1) {
            shape.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", shape)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Shape {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl From<Vec<usize>> for Shape {
    fn from(shape: Vec<usize>) -> Self {
        Self(shape.into())
    }
}

impl From<&[usize]> for Shape {
    fn from(slice: &[usize]) -> Self {
        Shape(slice.into())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(arr: [usize; N]) -> Self {
        Shape(arr.iter().copied().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Shape(iter.into_iter().collect())
    }
}

impl std::str::FromStr for Shape {
    type Err = InvalidArgument;

    /// Parses `5,3,6,9` or `5x3x6x9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')'])
            .split([',', 'x'])
            .filter(|tok| !tok.trim().is_empty())
            .map(|tok| {
                tok.trim()
                    .parse::<usize>()
                    .map_err(|_| InvalidArgument::MalformedShape(s.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{shape, InvalidArgument, Shape};

    #[test]
    fn test_resolve_dim() {
        let shape = shape![5, 3, 6, 9];
        assert_eq!(shape.resolve_dim(2).unwrap(), 2);
        assert_eq!(shape.resolve_dim(-1).unwrap(), 3);
        assert_eq!(shape.resolve_dim(-4).unwrap(), 0);
        assert!(matches!(
            shape.resolve_dim(5),
            Err(InvalidArgument::DimOutOfRange { dim: 5, rank: 4 })
        ));
        assert!(shape.resolve_dim(-5).is_err());
        assert!(shape.resolve_dim(isize::MIN).is_err());
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!("5,3,6,9".parse::<Shape>().unwrap(), shape![5, 3, 6, 9]);
        assert_eq!("[4x2]".parse::<Shape>().unwrap(), shape![4, 2]);
        assert_eq!("(7)".parse::<Shape>().unwrap(), shape![7]);
        assert!("5,a".parse::<Shape>().is_err());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", shape![5, 3, 6, 9]), "[5x3x6x9]");
        assert_eq!(shape![2, 3].block_size(0), 3);
    }

    #[test]
    fn test_iter_reverses() {
        let axes = shape![2, 3, 4]
            .iter()
            .enumerate()
            .rev()
            .map(|(axis, &extent)| (axis, extent))
            .collect::<Vec<_>>();
        assert_eq!(axes, vec![(2, 4), (1, 3), (0, 2)]);
    }
}
