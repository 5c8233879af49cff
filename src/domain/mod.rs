//! Domain layer: models, ports, pointer navigation, and error taxonomy.

pub mod errors;
pub mod models;
pub mod pointer;
pub mod ports;
