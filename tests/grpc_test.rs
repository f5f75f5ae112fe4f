use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::{Code, Request};

use service_registry::registry::registry_service_client::RegistryServiceClient;
use service_registry::registry::registry_service_server::RegistryService;
use service_registry::registry::{
    FindRequest, RegisterRequest, UnregisterRequest, find_response::Outcome,
};
use service_registry::server;
use service_registry::services::registry::{RegistryGrpcService, ServiceRegistry};

async fn spawn_server(registry: ServiceRegistry) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(server::serve(listener, registry, async move {
        let _ = shutdown_rx.await;
    }));

    (format!("http://{addr}"), shutdown_tx)
}

#[tokio::test]
async fn test_register_find_unregister_over_grpc() {
    let registry = ServiceRegistry::new(30);
    let (endpoint, shutdown) = spawn_server(registry.clone()).await;
    let mut client = RegistryServiceClient::connect(endpoint)
        .await
        .expect("Failed to connect to registry");

    let register = || RegisterRequest {
        name: "mail".to_string(),
        version: "1.4.0".to_string(),
        port: 3001,
    };

    let first = client.register(register()).await.unwrap().into_inner();
    assert_eq!(first.status, "registered");
    assert_eq!(first.key, "mail@1.4.0/127.0.0.1:3001");

    let second = client.register(register()).await.unwrap().into_inner();
    assert_eq!(second.status, "updated");
    assert_eq!(second.key, first.key);

    let found = client
        .find(FindRequest {
            name: "mail".to_string(),
            version_range: "^1.0.0".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    match found.outcome {
        Some(Outcome::Instance(instance)) => {
            assert_eq!(instance.address, "127.0.0.1");
            assert_eq!(instance.port, 3001);
            assert_eq!(instance.version, "1.4.0");
            assert!(instance.last_heartbeat > 0);
        }
        other => panic!("expected instance, got {other:?}"),
    }

    let removed = client
        .unregister(UnregisterRequest {
            name: "mail".to_string(),
            version: "1.4.0".to_string(),
            port: 3001,
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(removed.status, "removed");
    assert_eq!(removed.key, first.key);
    assert!(registry.is_empty());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_forwarded_for_header_sets_identity() {
    let registry = ServiceRegistry::new(30);
    let (endpoint, shutdown) = spawn_server(registry.clone()).await;
    let mut client = RegistryServiceClient::connect(endpoint)
        .await
        .expect("Failed to connect to registry");

    let mut request = Request::new(RegisterRequest {
        name: "auth".to_string(),
        version: "2.0.0".to_string(),
        port: 9000,
    });
    request
        .metadata_mut()
        .insert("x-forwarded-for", "2001:db8::5, 10.0.0.1".parse().unwrap());

    let response = client.register(request).await.unwrap().into_inner();
    assert_eq!(response.key, "auth@2.0.0/[2001:db8::5]:9000");

    let instances = registry.instances();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].address, "2001:db8::5");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_junk_forwarded_for_falls_back_to_peer_address() {
    let registry = ServiceRegistry::new(30);
    let (endpoint, shutdown) = spawn_server(registry.clone()).await;
    let mut client = RegistryServiceClient::connect(endpoint)
        .await
        .expect("Failed to connect to registry");

    let mut request = Request::new(RegisterRequest {
        name: "task".to_string(),
        version: "1.0.0".to_string(),
        port: 4100,
    });
    request
        .metadata_mut()
        .insert("x-forwarded-for", "not an ip/x, 10.0.0.1".parse().unwrap());

    let response = client.register(request).await.unwrap().into_inner();
    assert_eq!(response.key, "task@1.0.0/127.0.0.1:4100");

    let instances = registry.instances();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].address, "127.0.0.1");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_find_not_found_is_ok_response() {
    let service = RegistryGrpcService::new(ServiceRegistry::new(30));

    let response = service
        .find(Request::new(FindRequest {
            name: "task".to_string(),
            version_range: "^1.0.0".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    match response.outcome {
        Some(Outcome::NotFound(not_found)) => {
            assert_eq!(not_found.name, "task");
            assert_eq!(not_found.version_range, "^1.0.0");
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_arguments_map_to_status() {
    let service = RegistryGrpcService::new(ServiceRegistry::new(30));

    let status = service
        .find(Request::new(FindRequest {
            name: "task".to_string(),
            version_range: "abc".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    // 没有对端地址也没有转发头
    let status = service
        .register(Request::new(RegisterRequest {
            name: "task".to_string(),
            version: "1.0.0".to_string(),
            port: 4000,
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let mut request = Request::new(RegisterRequest {
        name: "task".to_string(),
        version: "1.0.0".to_string(),
        port: 70_000,
    });
    request
        .metadata_mut()
        .insert("x-forwarded-for", "10.0.0.9".parse().unwrap());
    let status = service.register(request).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let mut request = Request::new(RegisterRequest {
        name: "task".to_string(),
        version: "latest".to_string(),
        port: 4000,
    });
    request
        .metadata_mut()
        .insert("x-forwarded-for", "10.0.0.9".parse().unwrap());
    let status = service.register(request).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}
