mod broadcast_publisher;

pub use broadcast_publisher::BroadcastEventPublisher;
