use tonic::{Request, Response, Status};

use super::address::caller_address;
use super::service::ServiceRegistry;
use super::types::{RegistryError, ServiceInstance};
use crate::registry::{
    FindRequest, FindResponse, InstanceInfo, NotFound, RegisterRequest, RegisterResponse,
    UnregisterRequest, UnregisterResponse, find_response::Outcome,
    registry_service_server::RegistryService,
};

/// 注册中心的 gRPC 适配层，只负责协议转换与调用方地址提取
#[derive(Debug, Clone)]
pub struct RegistryGrpcService {
    pub registry: ServiceRegistry,
}

impl RegistryGrpcService {
    pub fn new(registry: ServiceRegistry) -> Self {
        Self { registry }
    }
}

impl From<RegistryError> for Status {
    fn from(error: RegistryError) -> Self {
        Status::invalid_argument(error.to_string())
    }
}

impl From<ServiceInstance> for InstanceInfo {
    fn from(instance: ServiceInstance) -> Self {
        Self {
            name: instance.name,
            version: instance.version,
            address: instance.address,
            port: u32::from(instance.port),
            last_heartbeat: instance.last_heartbeat,
        }
    }
}

fn require_address<T>(request: &Request<T>) -> Result<String, Status> {
    caller_address(request)
        .ok_or_else(|| Status::invalid_argument("Unable to determine caller address"))
}

fn to_port(port: u32) -> Result<u16, Status> {
    u16::try_from(port).map_err(|_| {
        RegistryError::invalid_identity(format!("port {port} is out of range")).into()
    })
}

#[tonic::async_trait]
impl RegistryService for RegistryGrpcService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let address = require_address(&request)?;
        let req = request.into_inner();
        let port = to_port(req.port)?;

        let registration = self
            .registry
            .register(&req.name, &req.version, &address, port)?;

        Ok(Response::new(RegisterResponse {
            key: registration.key.to_string(),
            status: registration.status().to_string(),
        }))
    }

    async fn unregister(
        &self,
        request: Request<UnregisterRequest>,
    ) -> Result<Response<UnregisterResponse>, Status> {
        let address = require_address(&request)?;
        let req = request.into_inner();
        let port = to_port(req.port)?;

        let unregistration = self
            .registry
            .unregister(&req.name, &req.version, &address, port)?;

        Ok(Response::new(UnregisterResponse {
            key: unregistration.key.to_string(),
            status: unregistration.status().to_string(),
        }))
    }

    async fn find(
        &self,
        request: Request<FindRequest>,
    ) -> Result<Response<FindResponse>, Status> {
        let req = request.into_inner();

        let outcome = match self.registry.find(&req.name, &req.version_range)? {
            Some(instance) => Outcome::Instance(instance.into()),
            None => Outcome::NotFound(NotFound {
                name: req.name,
                version_range: req.version_range,
            }),
        };

        Ok(Response::new(FindResponse {
            outcome: Some(outcome),
        }))
    }
}
