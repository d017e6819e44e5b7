pub mod area;
pub mod history;
pub mod pool;
pub mod sink;
