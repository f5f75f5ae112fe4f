use std::future::Future;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tonic::transport::Server;

use crate::config::Config;
use crate::registry::registry_service_server::RegistryServiceServer;
use crate::services::registry::sweeper::spawn_sweeper;
use crate::services::registry::{RegistryGrpcService, ServiceRegistry};

pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.listen_addr()?;

    // 初始化服务注册表
    let registry = ServiceRegistry::from_config(&config.registry);

    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    if let Some(interval) = config.registry.sweep_interval() {
        spawn_sweeper(registry.clone(), interval, &tracker, token.clone());
    }

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        ttl_secs = config.registry.ttl_seconds,
        selection = ?config.registry.selection,
        "Service registry listening"
    );

    let shutdown_token = token.clone();
    let result = serve(listener, registry, async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
            }
            _ = shutdown_token.cancelled() => {}
        }
    })
    .await;

    // 停止后台任务
    token.cancel();
    tracker.close();
    tracker.wait().await;

    result?;
    Ok(())
}

/// 在给定监听器上提供注册中心 gRPC 服务，直到 `shutdown` 完成
pub async fn serve<F>(
    listener: TcpListener,
    registry: ServiceRegistry,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    F: Future<Output = ()>,
{
    let registry_service = RegistryGrpcService::new(registry);

    Server::builder()
        .add_service(RegistryServiceServer::new(registry_service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
}
