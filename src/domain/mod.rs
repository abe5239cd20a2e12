// Domain layer: upstream records, resolved chapters and the transport port.

pub mod model;
pub mod ports;
