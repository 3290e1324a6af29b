mod quad;

pub use quad::*;
