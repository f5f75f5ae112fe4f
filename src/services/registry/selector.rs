use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::ServiceInstance;

/// 负载均衡选择策略，返回被选中候选的下标
pub trait SelectionStrategy: Send + Sync + Debug {
    fn select(&self, candidates: &[ServiceInstance]) -> Option<usize>;

    fn name(&self) -> &'static str;
}

/// 均匀随机选择，调用之间不保留状态
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn select(&self, candidates: &[ServiceInstance]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        Some(rand::rng().random_range(0..candidates.len()))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// 轮询选择
#[derive(Debug, Default)]
pub struct RoundRobinSelection {
    cursor: AtomicUsize,
}

impl SelectionStrategy for RoundRobinSelection {
    fn select(&self, candidates: &[ServiceInstance]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        Some(idx % candidates.len())
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}

/// 配置中可选的策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    #[default]
    Random,
    RoundRobin,
}

impl SelectionKind {
    pub fn build(self) -> Arc<dyn SelectionStrategy> {
        match self {
            SelectionKind::Random => Arc::new(RandomSelection),
            SelectionKind::RoundRobin => Arc::new(RoundRobinSelection::default()),
        }
    }
}
