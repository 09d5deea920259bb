mod whip_engine;

pub use whip_engine::WhipMediaEngine;
