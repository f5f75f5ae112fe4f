use std::net::{IpAddr, SocketAddr};

use tonic::Request;
use tonic::metadata::MetadataMap;

/// 代理转发的客户端地址头
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// 推导调用方地址：优先取 `x-forwarded-for` 的第一跳，否则取连接对端地址
pub fn caller_address<T>(request: &Request<T>) -> Option<String> {
    forwarded_address(request.metadata())
        .or_else(|| request.remote_addr().map(|addr| addr.ip().to_canonical().to_string()))
}

fn forwarded_address(metadata: &MetadataMap) -> Option<String> {
    let value = metadata.get(FORWARDED_FOR_HEADER)?.to_str().ok()?;
    let first_hop = value.split(',').next()?;
    normalize_address(first_hop)
}

/// 规范化地址字面量：去掉方括号与端口，IP 统一为标准形式
///
/// 无法解析为 IP 的值返回 `None`，调用方随后回退到连接对端地址。
pub fn normalize_address(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(addr) = trimmed.parse::<SocketAddr>() {
        return Some(addr.ip().to_canonical().to_string());
    }

    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    unbracketed
        .parse::<IpAddr>()
        .ok()
        .map(|ip| ip.to_canonical().to_string())
}
