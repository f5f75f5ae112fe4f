use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::service::ServiceRegistry;

/// 启动后台定期清理任务，直到 `token` 被取消
///
/// 与访问时清理走同一条路径，只用于回收长期无人查询的过期条目。
pub fn spawn_sweeper(
    registry: ServiceRegistry,
    interval: Duration,
    tracker: &TaskTracker,
    token: CancellationToken,
) {
    tracker.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Registry sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    tracing::debug!("Executing service expiration check...");
                    registry.sweep();
                }
            }
        }
    });
}
