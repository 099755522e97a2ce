// Adapters layer: concrete implementations for external systems (http api, storage, report output)

pub mod http;
pub mod report;
pub mod storage;
