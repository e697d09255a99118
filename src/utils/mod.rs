// Utils compartidos

pub mod storage;
pub mod runtime;

pub use runtime::Runtime;
