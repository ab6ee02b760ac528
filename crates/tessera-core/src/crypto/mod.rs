mod hash;

pub use hash::{sha256, Hash};
