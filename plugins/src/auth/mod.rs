pub mod http_client;
pub mod local;

pub use http_client::HttpAuthProvider;
pub use local::LocalAuthProvider;
