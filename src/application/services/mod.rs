pub mod backoff;
pub mod dispatch_bus;
pub mod partitioner;
pub mod sender;
