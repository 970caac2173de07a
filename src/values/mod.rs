mod key_digest;

pub use key_digest::*;
