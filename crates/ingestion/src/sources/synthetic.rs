//! SyntheticSource - 按模板生成事实
//!
//! 第 i 个事实 (从 1 开始): `value = i`, `comment = "<prefix> i"`，
//! 其余字段取自模板。

use contracts::{ContractError, Fact, FactSource, FactTemplate, ProducerConfig};
use tracing::trace;

/// 合成事实来源
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    name: String,
    template: FactTemplate,
    comment_prefix: String,
    count: u64,
    emitted: u64,
}

impl SyntheticSource {
    /// 创建合成来源，共生成 `count` 个事实
    pub fn new(template: FactTemplate, comment_prefix: impl Into<String>, count: u64) -> Self {
        Self {
            name: "synthetic".to_string(),
            template,
            comment_prefix: comment_prefix.into(),
            count,
            emitted: 0,
        }
    }

    /// 从生产者配置创建
    pub fn from_config(config: &ProducerConfig) -> Self {
        Self::new(
            config.template.clone(),
            config.comment_prefix.clone(),
            config.count,
        )
    }

    /// 尚未生成的事实数
    pub fn remaining(&self) -> u64 {
        self.count - self.emitted
    }

    fn build(&self, i: u64) -> Fact {
        let t = &self.template;
        Fact {
            period_start: t.period_start.clone(),
            period_end: t.period_end.clone(),
            period_key: t.period_key.clone(),
            indicator_to_mo_id: t.indicator_to_mo_id,
            indicator_to_mo_fact_id: t.indicator_to_mo_fact_id,
            value: i as i64,
            fact_time: t.fact_time.clone(),
            is_plan: t.is_plan,
            auth_user_id: t.auth_user_id,
            comment: format!("{} {}", self.comment_prefix, i),
        }
    }
}

impl FactSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_fact(&mut self) -> Result<Option<Fact>, ContractError> {
        if self.emitted >= self.count {
            return Ok(None);
        }
        self.emitted += 1;
        trace!(i = self.emitted, "synthetic fact generated");
        Ok(Some(self.build(self.emitted)))
    }
}
