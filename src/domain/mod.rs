// Domain layer: records, sheet model and the ports the core drives.

pub mod model;
pub mod ports;
pub mod sheet;
