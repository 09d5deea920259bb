pub mod bitrate_estimator;
mod endpoint_resolver;
pub mod stream_parameters;

pub use endpoint_resolver::{
    EndpointPorts, EndpointProtocol, EndpointResolver, PublicEndpoints, PublishTarget,
};
pub use stream_parameters::StreamParameters;
