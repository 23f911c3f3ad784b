pub mod defer_async;
pub mod ref_count;

pub use defer_async::{defer_async, DeferAsync};
pub use ref_count::RefCount;
