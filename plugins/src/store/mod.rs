pub mod http_client;
pub mod memory;
pub mod rows;

pub use http_client::HttpTaskStore;
pub use memory::InMemoryTaskStore;
