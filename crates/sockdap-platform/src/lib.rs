pub mod endpoint;
pub mod error;
pub mod paths;
pub mod scratch;

pub use endpoint::{random_name, EndpointAllocator, TransportEndpoint, RANDOM_NAME_LEN};
pub use error::PlatformError;
pub use paths::{DefaultPaths, PlatformPaths};
pub use scratch::ScratchDir;
