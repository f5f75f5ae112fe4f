use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::expiry::ExpiryPolicy;
use super::key::InstanceKey;
use super::types::ServiceInstance;

/// `upsert` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 新建条目（包括覆盖已过期的旧条目）
    Created,
    /// 刷新已有条目的心跳
    Refreshed,
    /// 时间戳早于已存储的心跳，忽略本次更新
    Stale { stored: u64 },
}

/// 身份键 -> 实例记录的并发映射
///
/// 基于分片锁的 `DashMap`，同一键上的写操作互斥。
#[derive(Debug, Clone, Default)]
pub struct InstanceStore {
    entries: Arc<DashMap<InstanceKey, ServiceInstance>>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入新记录或原地刷新心跳，同一键永远只有一条记录
    ///
    /// 心跳时间戳单调不减：比已存储值更旧的更新会被忽略。
    pub fn upsert(
        &self,
        key: InstanceKey,
        instance: ServiceInstance,
        policy: &ExpiryPolicy,
    ) -> UpsertOutcome {
        match self.entries.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(instance);
                UpsertOutcome::Created
            }
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                if policy.is_expired(stored, instance.last_heartbeat) {
                    *stored = instance;
                    UpsertOutcome::Created
                } else if instance.last_heartbeat < stored.last_heartbeat {
                    UpsertOutcome::Stale {
                        stored: stored.last_heartbeat,
                    }
                } else {
                    stored.last_heartbeat = instance.last_heartbeat;
                    UpsertOutcome::Refreshed
                }
            }
        }
    }

    /// 删除条目，不存在时为空操作
    pub fn remove(&self, key: &InstanceKey) -> Option<ServiceInstance> {
        self.entries.remove(key).map(|(_, instance)| instance)
    }

    /// 仅当条目在 `now` 时刻已过期才删除，检查与删除在同一把锁内完成
    pub fn remove_if_expired(&self, key: &InstanceKey, policy: &ExpiryPolicy, now: u64) -> bool {
        self.entries
            .remove_if(key, |_, instance| policy.is_expired(instance, now))
            .is_some()
    }

    pub fn get(&self, key: &InstanceKey) -> Option<ServiceInstance> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// 按键排序的时点副本，迭代期间不持有任何锁
    pub fn snapshot(&self) -> Vec<(InstanceKey, ServiceInstance)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
