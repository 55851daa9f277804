// Adapters layer: frame dump decoders and preview image encoding.

pub mod frames;
pub mod preview;
