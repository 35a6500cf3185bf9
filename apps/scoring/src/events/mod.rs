pub mod handlers;
pub mod publisher;
#[cfg(test)]
pub mod testing;

pub use publisher::{EventPublisher, LogEventPublisher, RedisEventPublisher};
