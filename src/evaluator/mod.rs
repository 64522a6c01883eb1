mod engine;

pub use engine::FrameEngine;
