use std::fmt;

use super::types::RegistryError;

/// 服务实例的身份键：(name, version, address, port)
///
/// 四个字段完全相同即为同一实例，任一字段不同即为不同实例。
/// 不做大小写或空白的规范化。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    name: String,
    version: String,
    address: String,
    port: u16,
}

impl InstanceKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// 由四元组构造身份键
pub fn build_key(
    name: &str,
    version: &str,
    address: &str,
    port: u16,
) -> Result<InstanceKey, RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::invalid_identity("service name must not be empty"));
    }
    if address.is_empty() {
        return Err(RegistryError::invalid_identity("address must not be empty"));
    }
    if port == 0 {
        return Err(RegistryError::invalid_identity("port must be a positive integer"));
    }

    Ok(InstanceKey {
        name: name.to_string(),
        version: version.to_string(),
        address: address.to_string(),
        port,
    })
}

// IPv6 地址嵌入组合字符串时需要加方括号
fn write_host(f: &mut fmt::Formatter<'_>, address: &str) -> fmt::Result {
    if address.contains(':') && !address.starts_with('[') {
        write!(f, "[{address}]")
    } else {
        f.write_str(address)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/", self.name, self.version)?;
        write_host(f, &self.address)?;
        write!(f, ":{}", self.port)
    }
}
