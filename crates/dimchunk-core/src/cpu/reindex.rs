use crate::{Strides, TensorDType};
use std::ops::Range;

/// Gathers the elements of `src` selected by `ranges` into a new contiguous buffer.
pub(crate) fn slice<T: TensorDType>(
    src: &[T],
    src_strides: &Strides,
    ranges: &[Range<usize>],
) -> Vec<T> {
    assert_eq!(ranges.len(), src_strides.rank());

    let dst_shape: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
    let dst_numel: usize = dst_shape.iter().product();

    let mut dst = Vec::with_capacity(dst_numel);
    let mut coord = vec![0; dst_shape.len()];

    for i in 0..dst_numel {
        let mut tmp = i;
        for d in (0..dst_shape.len()).rev() {
            coord[d] = ranges[d].start + tmp % dst_shape[d];
            tmp /= dst_shape[d];
        }
        dst.push(src[src_strides.offset_of(&coord)]);
    }

    dst
}
