// ==========================================
// 公共工程管理系统 - 工程字段校验（纯函数）
// ==========================================
// 红线: 无状态、无副作用、无 I/O 操作
// 规则按固定顺序检查，返回第一条违反的规则
// ==========================================
// 1. 工程编号必填
// 2. 名称非空
// 3. 执行工期 > 0
// 4. 执行年份 >= min_execution_year
// 5. 地区必填
// 6. 最终投资 > 0
// 7. 开工日期必填
// ==========================================

use crate::config::WorkRules;
use crate::domain::work::{WorkFields, WorkInput};
use crate::engine::error::{EngineError, EngineResult};
use rust_decimal::Decimal;

pub struct WorkValidator;

impl WorkValidator {
    /// 校验写入载荷并产出规整后的字段
    pub fn validate(input: &WorkInput, rules: &WorkRules) -> EngineResult<WorkFields> {
        let work_number = input
            .work_number
            .ok_or_else(|| invalid("工程编号为必填项"))?;

        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid("工程名称不能为空"))?;

        let execution_duration = match input.execution_duration {
            Some(d) if d > 0 => d,
            _ => return Err(invalid("执行工期必须大于 0")),
        };

        let execution_year = match input.execution_year {
            Some(y) if y >= rules.min_execution_year => y,
            _ => {
                return Err(invalid(&format!(
                    "执行年份必须大于等于 {}",
                    rules.min_execution_year
                )))
            }
        };

        let locality_id = input
            .locality_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("地区为必填项"))?;

        let final_investment = match input.final_investment {
            Some(v) if v > Decimal::ZERO => v,
            _ => return Err(invalid("最终投资必须大于 0")),
        };

        let start_date = input.start_date.ok_or_else(|| invalid("开工日期为必填项"))?;

        Ok(WorkFields {
            work_number,
            name: name.to_string(),
            execution_duration,
            execution_year,
            start_date,
            end_date: input.end_date,
            final_investment,
            locality_id: locality_id.to_string(),
        })
    }
}

fn invalid(msg: &str) -> EngineError {
    EngineError::Validation(msg.to_string())
}
