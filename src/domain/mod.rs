// Domain layer: frame models and ports (interfaces) the pipeline is written against.

pub mod model;
pub mod ports;
