pub mod fetcher;
pub mod retry;
pub mod transport;
