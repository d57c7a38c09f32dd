//! 配置校验模块
//!
//! 校验规则：
//! - queue.capacity > 0
//! - sink.name 非空，delivery_timeout_ms > 0
//! - http sink 必须提供可解析的 http(s) url；file sink 必须提供 path
//! - json_lines 来源必须提供 path；synthetic 来源 count > 0

use contracts::{ContractError, RelayBlueprint, SinkType, SourceType};
use reqwest::Url;

/// 校验 RelayBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_queue(blueprint)?;
    validate_producer(blueprint)?;
    validate_sink(blueprint)?;
    Ok(())
}

/// 校验队列容量
fn validate_queue(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be > 0",
        ));
    }
    Ok(())
}

/// 校验事实来源
fn validate_producer(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let producer = &blueprint.producer;
    match producer.source {
        SourceType::Synthetic => {
            if producer.count == 0 {
                return Err(ContractError::config_validation(
                    "producer.count",
                    "synthetic source count must be > 0",
                ));
            }
        }
        SourceType::JsonLines => {
            if producer.path.is_none() {
                return Err(ContractError::config_validation(
                    "producer.path",
                    "json_lines source requires a path",
                ));
            }
        }
    }
    Ok(())
}

/// 校验投递目标
fn validate_sink(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let sink = &blueprint.sink;

    if sink.name.is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    if sink.delivery_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "sink.delivery_timeout_ms",
            "delivery_timeout_ms must be > 0",
        ));
    }

    match sink.sink_type {
        SinkType::Http => {
            let url = sink.params.get("url").ok_or_else(|| {
                ContractError::config_validation("sink.params.url", "http sink requires a url")
            })?;
            let parsed = Url::parse(url).map_err(|e| {
                ContractError::config_validation(
                    "sink.params.url",
                    format!("invalid url '{url}': {e}"),
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ContractError::config_validation(
                    "sink.params.url",
                    format!("url scheme must be http:// or https://, got '{url}'"),
                ));
            }
        }
        SinkType::File => {
            if !sink.params.contains_key("path") {
                return Err(ContractError::config_validation(
                    "sink.params.path",
                    "file sink requires a path",
                ));
            }
        }
        SinkType::Log => {}
    }

    Ok(())
}
