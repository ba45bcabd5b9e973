pub mod line_info;
pub mod pp;

pub use line_info::*;
pub use pp::*;
