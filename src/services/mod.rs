pub mod registry;

pub use registry::{RegistryGrpcService, ServiceInstance, ServiceRegistry};
