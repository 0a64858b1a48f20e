pub mod descriptor;
pub mod translator;

pub use descriptor::*;
pub use translator::*;
