use std::sync::Arc;

use semver::Version;

use super::clock::{Clock, SystemClock};
use super::expiry::ExpiryPolicy;
use super::key::{InstanceKey, build_key};
use super::matcher::{VersionRange, matching_instances};
use super::selector::{RandomSelection, SelectionStrategy};
use super::store::{InstanceStore, UpsertOutcome};
use super::types::{Registration, RegistryError, ServiceInstance, Unregistration};
use crate::config::RegistryConfig;

/// 服务注册中心
///
/// 显式持有的注册表对象，TTL 在构造时给定，没有任何全局状态。
/// `Clone` 共享同一份存储。
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    store: InstanceStore,
    policy: ExpiryPolicy,
    clock: Arc<dyn Clock>,
    selector: Arc<dyn SelectionStrategy>,
}

impl ServiceRegistry {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: InstanceStore::new(),
            policy: ExpiryPolicy::new(ttl_seconds),
            clock: Arc::new(SystemClock),
            selector: Arc::new(RandomSelection),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.ttl_seconds).with_selection(config.selection.build())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_selection(mut self, selector: Arc<dyn SelectionStrategy>) -> Self {
        self.selector = selector;
        self
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    /// 注册实例或刷新心跳
    pub fn register(
        &self,
        name: &str,
        version: &str,
        address: &str,
        port: u16,
    ) -> Result<Registration, RegistryError> {
        let key = build_key(name, version, address, port)?;
        Version::parse(version).map_err(|e| {
            RegistryError::invalid_identity(format!("invalid semver version '{version}': {e}"))
        })?;

        let now = self.clock.now();
        self.policy.sweep(&self.store, now);

        let instance = ServiceInstance {
            name: name.to_string(),
            version: version.to_string(),
            address: address.to_string(),
            port,
            last_heartbeat: now,
        };

        let registration = match self.store.upsert(key.clone(), instance, &self.policy) {
            UpsertOutcome::Created => {
                tracing::info!(
                    key = %key,
                    service_name = %name,
                    version = %version,
                    "Registered service instance"
                );
                Registration {
                    key,
                    created: true,
                    last_heartbeat: now,
                }
            }
            UpsertOutcome::Refreshed => {
                tracing::debug!(key = %key, "Refreshed service heartbeat");
                Registration {
                    key,
                    created: false,
                    last_heartbeat: now,
                }
            }
            UpsertOutcome::Stale { stored } => {
                tracing::warn!(
                    key = %key,
                    heartbeat = now,
                    stored_heartbeat = stored,
                    "Ignoring heartbeat older than the stored one"
                );
                Registration {
                    key,
                    created: false,
                    last_heartbeat: stored,
                }
            }
        };

        Ok(registration)
    }

    /// 注销实例，条目不存在也视为成功
    pub fn unregister(
        &self,
        name: &str,
        version: &str,
        address: &str,
        port: u16,
    ) -> Result<Unregistration, RegistryError> {
        let key = build_key(name, version, address, port)?;
        let removed = self.store.remove(&key).is_some();

        if removed {
            tracing::info!(key = %key, service_name = %name, "Unregistered service instance");
        } else {
            tracing::debug!(key = %key, "Unregister for unknown instance, nothing to remove");
        }

        Ok(Unregistration { key, removed })
    }

    /// 按名称与版本范围查找一个存活实例，没有匹配时返回 `Ok(None)`
    pub fn find(
        &self,
        name: &str,
        version_range: &str,
    ) -> Result<Option<ServiceInstance>, RegistryError> {
        let range = VersionRange::parse(version_range)?;

        let now = self.clock.now();
        self.policy.sweep(&self.store, now);

        let live = self.live_instances(now);
        let candidates = matching_instances(&live, name, &range);

        let selected = self
            .selector
            .select(&candidates)
            .and_then(|idx| candidates.get(idx).cloned());

        match &selected {
            Some(instance) => tracing::debug!(
                service_name = %name,
                version_range = %range,
                candidates = candidates.len(),
                strategy = self.selector.name(),
                address = %instance.address,
                port = instance.port,
                "Selected service instance"
            ),
            None => tracing::debug!(
                service_name = %name,
                version_range = %range,
                "No live instance matches"
            ),
        }

        Ok(selected)
    }

    /// 清理过期条目，返回删除数量
    pub fn sweep(&self) -> usize {
        self.policy.sweep(&self.store, self.clock.now())
    }

    /// 所有存活实例（按身份键排序）
    pub fn instances(&self) -> Vec<ServiceInstance> {
        let now = self.clock.now();
        self.policy.sweep(&self.store, now);
        self.live_instances(now)
    }

    pub fn get(&self, key: &InstanceKey) -> Option<ServiceInstance> {
        let now = self.clock.now();
        self.store
            .get(key)
            .filter(|instance| !self.policy.is_expired(instance, now))
    }

    /// 存储中的物理条目数
    ///
    /// 不触发清理，可能包含已过期但尚未被清理的条目；需要存活视图时用 `instances()`。
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// 与 `len()` 相同，按物理条目判断
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // 快照之后仍然按时间过滤一次，保证不返回逻辑上已过期的条目
    fn live_instances(&self, now: u64) -> Vec<ServiceInstance> {
        self.store
            .snapshot()
            .into_iter()
            .map(|(_, instance)| instance)
            .filter(|instance| !self.policy.is_expired(instance, now))
            .collect()
    }
}
