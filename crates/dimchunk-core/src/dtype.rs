use half::{bf16, f16};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    I32,
    U32,
}

impl DType {
    pub fn size_of(self) -> usize {
        match self {
            DType::F16 | DType::BF16 => 2,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F64 => 8,
        }
    }
}

pub trait TensorDType:
    Clone
    + Copy
    + std::fmt::Debug
    + PartialEq
    + 'static
    + num_traits::Zero
    + Send
    + Sync
    + bytemuck::Pod
{
    fn dt() -> DType;

    fn one() -> Self;
}

macro_rules! map_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for $t {
            fn dt() -> DType {
                DType::$v
            }

            fn one() -> Self {
                1 as Self
            }
        }
    };
}

macro_rules! map_half_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for $t {
            fn dt() -> DType {
                DType::$v
            }

            fn one() -> Self {
                <$t>::ONE
            }
        }
    };
}

map_type!(f32, F32);
map_type!(f64, F64);
map_type!(i32, I32);
map_type!(u32, U32);
map_half_type!(f16, F16);
map_half_type!(bf16, BF16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(f16::dt().size_of(), std::mem::size_of::<f16>());
        assert_eq!(f64::dt().size_of(), std::mem::size_of::<f64>());
        assert_eq!(DType::BF16.to_string(), "BF16");
    }
}
