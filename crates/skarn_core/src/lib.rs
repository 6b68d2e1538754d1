pub mod channel;
pub mod pool;
