pub mod meta;
pub mod palette;
pub mod region;
