mod chunk;
mod slice;

pub use chunk::*;
pub use slice::*;
