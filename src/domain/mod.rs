// Domain layer: form models, API payloads, option tables and ports.

pub mod api;
pub mod model;
pub mod options;
pub mod ports;
