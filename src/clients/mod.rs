pub mod gateway;
pub mod http_gateway;

pub use gateway::{BulkCreateResult, PersistenceGateway};
pub use http_gateway::HttpGateway;
