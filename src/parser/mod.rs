mod diagnostics;
mod parser;

pub use diagnostics::*;
pub use parser::*;
