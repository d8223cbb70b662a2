// Domain layer: element model and the ports the core is wired through.

pub mod model;
pub mod ports;
