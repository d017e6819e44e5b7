pub mod blend;
pub mod buffer;
