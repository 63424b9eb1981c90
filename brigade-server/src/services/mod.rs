//! Business services behind the HTTP layer

pub mod intake;
pub mod sequence;
