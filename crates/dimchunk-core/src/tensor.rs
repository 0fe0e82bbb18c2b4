use crate::cpu::{concat, slice};
use crate::{
    chunk, split, DType, Materialize, OperationError, Shape, SliceSpec, Strides, TensorDType,
};

/// # Tensor
///
/// Contiguous, row-major host tensor.
///
/// Used as the reference [`Materialize`] implementation: every view is a copy
/// of the selected region.
#[derive(Clone, PartialEq)]
pub struct Tensor<T: TensorDType> {
    shape: Shape,
    strides: Strides,
    data: Vec<T>,
}

impl<T: TensorDType> Tensor<T> {
    /// Creates a new tensor from a chunk of data.
    pub fn from_data<U: AsRef<[T]>>(data: U, shape: Shape) -> Result<Self, OperationError> {
        let data = data.as_ref().to_vec();
        if data.len() != shape.numel() {
            return Err(OperationError::DataLength {
                expected: shape.numel(),
                actual: data.len(),
                shape,
            });
        }
        let strides = Strides::from(&shape);
        Ok(Self {
            shape,
            strides,
            data,
        })
    }

    pub fn zeros(shape: Shape) -> Self {
        let strides = Strides::from(&shape);
        let data = vec![T::zero(); shape.numel()];
        Self {
            shape,
            strides,
            data,
        }
    }

    /// `0, 1, 2, ...` laid out row-major over `shape`.
    pub fn arange(shape: Shape) -> Self {
        let strides = Strides::from(&shape);
        let data = std::iter::successors(Some(T::zero()), |&x| Some(x + T::one()))
            .take(shape.numel())
            .collect();
        Self {
            shape,
            strides,
            data,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dt(&self) -> DType {
        T::dt()
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Splits into at most `chunks` tensors along `dim`.
    pub fn chunk(&self, chunks: usize, dim: isize) -> Result<Vec<Self>, OperationError> {
        chunk(self, chunks, dim)
    }

    /// Splits into tensors of `split_size` along `dim`.
    pub fn split(&self, split_size: usize, dim: isize) -> Result<Vec<Self>, OperationError> {
        split(self, split_size, dim)
    }

    /// Concatenates `tensors` along `dim`. All other extents must agree.
    pub fn cat(tensors: &[Self], dim: isize) -> Result<Self, OperationError> {
        let first = tensors.first().ok_or(OperationError::EmptyInputs)?;
        let dim = first.shape.resolve_dim(dim)?;
        let mut dst_shape = first.shape.clone();
        dst_shape[dim] = 0;
        for t in tensors {
            if t.rank() != first.rank() {
                return Err(OperationError::RankMismatch {
                    expected: first.rank(),
                    actual: t.rank(),
                });
            }
            for (d, (&a, &b)) in first.shape.iter().zip(t.shape.iter()).enumerate() {
                if d != dim && a != b {
                    return Err(OperationError::ShapeMismatch { dim: d, a, b });
                }
            }
            dst_shape[dim] += t.shape[dim];
        }

        let mut dst = Self::zeros(dst_shape);
        let inputs = tensors
            .iter()
            .map(|t| (&t.shape, t.data.as_slice()))
            .collect::<Vec<_>>();
        concat(&inputs, dim, &dst.shape, &mut dst.data);
        Ok(dst)
    }
}

impl<T: TensorDType> Materialize for Tensor<T> {
    type View = Tensor<T>;

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn slice(&self, spec: &SliceSpec) -> Result<Self::View, OperationError> {
        let ranges = spec.resolve(&self.shape)?;
        let dst_shape: Shape = ranges.iter().map(|r| r.len()).collect();
        let data = slice(&self.data, &self.strides, &ranges);
        log::trace!("slice {} of {:?} -> {:?}", spec, self.shape, dst_shape);
        Tensor::from_data(data, dst_shape)
    }
}

impl<T: TensorDType> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("dt", &self.dt())
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .finish()
    }
}
