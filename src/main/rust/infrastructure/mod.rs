pub mod bridge;
pub mod events;
pub mod media_engine;
pub mod metrics;
pub mod persistence;
pub mod sdm;
