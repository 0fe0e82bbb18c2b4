mod concat;
mod reindex;

pub(crate) use concat::concat;
pub(crate) use reindex::slice;
