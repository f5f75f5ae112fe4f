use std::fmt;

use semver::{Comparator, Op, Version, VersionReq};

use super::types::{RegistryError, ServiceInstance};

/// 版本范围
///
/// 语法采用 `semver` crate 的 requirement 语法（`^1.2.3`、`~1.2`、
/// `>=1.0.0, <2.0.0`、`1.*`、`*`、`=1.2.3`）。完整的裸版本号如 `1.2.3`
/// 表示精确匹配，而不是隐式的 caret 范围。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    req: VersionReq,
}

impl VersionRange {
    pub fn parse(range: &str) -> Result<Self, RegistryError> {
        let trimmed = range.trim();

        let req = match Version::parse(trimmed) {
            Ok(version) => exact(&version),
            Err(_) => VersionReq::parse(trimmed).map_err(|source| {
                RegistryError::InvalidVersionRange {
                    range: range.to_string(),
                    source,
                }
            })?,
        };

        Ok(Self {
            raw: range.to_string(),
            req,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn exact(version: &Version) -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::Exact,
            major: version.major,
            minor: Some(version.minor),
            patch: Some(version.patch),
            pre: version.pre.clone(),
        }],
    }
}

/// 按名称（区分大小写）与版本范围过滤实例
///
/// 存储的版本号无法解析时跳过该实例。
pub fn matching_instances<'a, I>(
    instances: I,
    name: &str,
    range: &VersionRange,
) -> Vec<ServiceInstance>
where
    I: IntoIterator<Item = &'a ServiceInstance>,
{
    instances
        .into_iter()
        .filter(|instance| instance.name == name)
        .filter(|instance| match Version::parse(&instance.version) {
            Ok(version) => range.matches(&version),
            Err(e) => {
                tracing::warn!(
                    service_name = %instance.name,
                    version = %instance.version,
                    error = %e,
                    "Skipping instance with unparseable version"
                );
                false
            }
        })
        .cloned()
        .collect()
}
