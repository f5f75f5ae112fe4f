use super::store::InstanceStore;
use super::types::ServiceInstance;

/// 默认心跳超时（秒）
pub const DEFAULT_TTL_SECONDS: u64 = 30;

/// 心跳过期策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl_seconds: u64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS)
    }
}

impl ExpiryPolicy {
    pub fn new(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// `last_heartbeat + ttl < now` 即视为过期
    pub fn is_expired(&self, instance: &ServiceInstance, now: u64) -> bool {
        instance.last_heartbeat.saturating_add(self.ttl_seconds) < now
    }

    /// 清理存储中所有过期条目，返回删除数量
    pub fn sweep(&self, store: &InstanceStore, now: u64) -> usize {
        let mut removed = 0;

        for (key, instance) in store.snapshot() {
            if !self.is_expired(&instance, now) {
                continue;
            }

            // 在键锁内再次检查，避免删掉刚被刷新的条目
            if store.remove_if_expired(&key, self, now) {
                tracing::warn!(
                    key = %key,
                    service_name = %instance.name,
                    elapsed_secs = now.saturating_sub(instance.last_heartbeat),
                    ttl_secs = self.ttl_seconds,
                    "Service expired due to heartbeat timeout, removed from registry"
                );
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(expired_count = removed, "Sweep completed");
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry::key::build_key;

    fn instance_at(last_heartbeat: u64) -> ServiceInstance {
        ServiceInstance {
            name: "mail".to_string(),
            version: "1.0.0".to_string(),
            address: "10.0.0.1".to_string(),
            port: 3000,
            last_heartbeat,
        }
    }

    #[test]
    fn default_ttl_is_thirty_seconds() {
        assert_eq!(ExpiryPolicy::default().ttl_seconds(), DEFAULT_TTL_SECONDS);
        assert_eq!(DEFAULT_TTL_SECONDS, 30);
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let policy = ExpiryPolicy::new(30);
        let instance = instance_at(100);
        assert!(!policy.is_expired(&instance, 129));
        assert!(!policy.is_expired(&instance, 130));
        assert!(policy.is_expired(&instance, 131));
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let policy = ExpiryPolicy::new(30);
        let store = InstanceStore::new();

        let old = build_key("mail", "1.0.0", "10.0.0.1", 3000).unwrap();
        let fresh = build_key("mail", "1.0.0", "10.0.0.2", 3000).unwrap();
        store.upsert(old.clone(), instance_at(100), &policy);
        let mut live = instance_at(150);
        live.address = "10.0.0.2".to_string();
        store.upsert(fresh.clone(), live, &policy);

        assert_eq!(policy.sweep(&store, 140), 1);
        assert!(store.get(&old).is_none());
        assert!(store.get(&fresh).is_some());

        // 幂等
        assert_eq!(policy.sweep(&store, 140), 0);
        assert_eq!(store.len(), 1);
    }
}
