//! Registry service module
//!
//! This module contains the service registry implementation split into logical components:
//! - `key`: Identity key derived from (name, version, address, port)
//! - `store`: Concurrent instance store
//! - `expiry`: Heartbeat TTL policy and sweep
//! - `matcher` / `selector`: Semver range filtering and load-balancing pick
//! - `service`: The registry facade (register / unregister / find)
//! - `grpc_impl`: gRPC trait implementation

pub mod address;
pub mod clock;
pub mod expiry;
pub mod grpc_impl;
pub mod key;
pub mod matcher;
pub mod selector;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod types;

// Re-export public types for easier access
pub use clock::{Clock, ManualClock, SystemClock};
pub use expiry::{DEFAULT_TTL_SECONDS, ExpiryPolicy};
pub use grpc_impl::RegistryGrpcService;
pub use key::{InstanceKey, build_key};
pub use matcher::VersionRange;
pub use selector::{RandomSelection, RoundRobinSelection, SelectionKind, SelectionStrategy};
pub use service::ServiceRegistry;
pub use store::{InstanceStore, UpsertOutcome};
pub use types::{
    Registration, RegistrationStatus, RegistryError, ServiceInstance, Unregistration,
};
