use crate::{Shape, TensorDType};

/// Writes `inputs` one after another along `dim` into `dst`, which must
/// already have the concatenated shape.
pub(crate) fn concat<T: TensorDType>(
    inputs: &[(&Shape, &[T])],
    dim: usize,
    dst_shape: &Shape,
    dst: &mut [T],
) {
    let dst_dim_len = dst_shape[dim];
    let block = dst_shape.block_size(dim);
    let dst_s = block * dst_dim_len;
    let mut dst_o = 0;
    for (src_s, src) in inputs {
        let a_dim: usize = src_s.iter().take(dim).product();
        let b_dim = block * src_s[dim];
        for idx in 0..a_dim {
            let dst_idx = idx * dst_s + dst_o;
            let src_idx = idx * b_dim;
            dst[dst_idx..dst_idx + b_dim].copy_from_slice(&src[src_idx..src_idx + b_dim]);
        }
        dst_o += b_dim;
    }
}
