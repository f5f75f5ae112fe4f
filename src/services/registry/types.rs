use std::fmt;

use thiserror::Error;

use super::key::InstanceKey;

/// 一次存活的服务实例公告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub name: String,
    pub version: String,
    /// 观测到的调用方地址（不带方括号的 IP 字面量）
    pub address: String,
    pub port: u16,
    /// 最近一次心跳的 Unix 时间戳（秒）
    pub last_heartbeat: u64,
}

/// 注册结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub key: InstanceKey,
    /// true 表示新建条目，false 表示心跳刷新
    pub created: bool,
    /// 存储中生效的心跳时间戳
    pub last_heartbeat: u64,
}

impl Registration {
    pub fn status(&self) -> RegistrationStatus {
        if self.created {
            RegistrationStatus::Registered
        } else {
            RegistrationStatus::Updated
        }
    }
}

/// 注销结果，条目不存在时 `removed` 为 false，但仍然是成功
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unregistration {
    pub key: InstanceKey,
    pub removed: bool,
}

impl Unregistration {
    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus::Removed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Updated,
    Removed,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Updated => "updated",
            RegistrationStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 注册中心错误类型
///
/// "未找到" 不是错误：`find` 返回 `Ok(None)`，`unregister` 返回 `removed = false`。
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid service identity: {reason}")]
    InvalidIdentity { reason: String },

    #[error("Invalid version range '{range}': {source}")]
    InvalidVersionRange {
        range: String,
        #[source]
        source: semver::Error,
    },
}

impl RegistryError {
    pub(crate) fn invalid_identity(reason: impl Into<String>) -> Self {
        RegistryError::InvalidIdentity {
            reason: reason.into(),
        }
    }
}
