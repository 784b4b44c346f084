// ==========================================
// 工程生命周期集成测试
// ==========================================
// 测试范围:
// 1. 创建 → 初始状态 → 状态迁移 → 分配计划 → 停用
// 2. 终态不可修改
// 3. 字段校验与引用校验
// 4. 已停用工程的写操作
// ==========================================


use chrono::NaiveDate;
use rust_decimal::Decimal;

use gestion_obras::api::ApiError;
use test_helpers::Fixture;

// ==========================================
// 完整生命周期
// ==========================================

#[test]
fn test_work_lifecycle_完整流程() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;

    // 1. 无计划创建 → 自动打开 Planificacion 记录
    let w1 = api.create(fx.work_input(2001)).expect("创建失败");
    assert_eq!(
        api.current_state_name(&w1.record.id).unwrap().as_deref(),
        Some("Planificacion")
    );

    // 2. 迁移到 Ejecucion → 旧记录关闭，新记录打开
    let entry = api
        .change_state(&w1.record.id, &fx.ejecucion.record.id)
        .expect("状态迁移失败");
    assert!(entry.is_open());
    assert_eq!(entry.state_id, fx.ejecucion.record.id);

    let history = api.list_history(&w1.record.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].state_name, "Planificacion");
    assert!(history[0].ended_at.is_some(), "旧记录应已关闭");
    assert_eq!(history[1].state_name, "Ejecucion");
    assert!(history[1].ended_at.is_none());

    // 3. 分配计划 P1 → 执行标志为 true
    let p1 = fx.env.plan("Statue Renovation Plan", &fx.rubro);
    assert!(!p1.in_execution);
    let mut input = fx.work_input(2001);
    input.plan_id = Some(p1.record.id.clone());
    api.update(&w1.record.id, input).expect("更新失败");
    assert!(fx.env.state.plan_api.get_active(&p1.record.id).unwrap().in_execution);

    // 4. 停用工程 → 执行标志回到 false
    api.deactivate(&w1.record.id).expect("停用失败");
    assert!(!fx.env.state.plan_api.get_active(&p1.record.id).unwrap().in_execution);

    let detail = api.get_detail(&w1.record.id).unwrap();
    assert!(!detail.work.record.is_active());
    assert_eq!(detail.current_state.as_deref(), Some("Ejecucion"));
}

#[test]
fn test_create_无初始状态时没有当前状态() {
    let env = test_helpers::TestEnv::new().unwrap();
    let department = env.department("Nevada");
    let locality = env.locality("Las Vegas", &department);

    let work = env
        .state
        .work_api
        .create(gestion_obras::domain::WorkInput {
            work_number: Some(7),
            name: Some("Monorail".to_string()),
            execution_duration: Some(12),
            execution_year: Some(2025),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            end_date: None,
            final_investment: Some(Decimal::new(400_000, 0)),
            locality_id: Some(locality.record.id.clone()),
            plan_id: None,
            risk_ids: None,
        })
        .unwrap();

    assert!(env.state.work_api.current_state_name(&work.record.id).unwrap().is_none());
    assert!(env.state.work_api.list_history(&work.record.id).unwrap().is_empty());
}

#[test]
fn test_change_state_迁移到相同状态() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let work = api.create(fx.work_input(1)).unwrap();

    api.change_state(&work.record.id, &fx.planificacion.record.id)
        .expect("迁移到当前状态应允许");

    let history = api.list_history(&work.record.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|h| h.ended_at.is_none()).count(), 1);
}

// ==========================================
// 终态
// ==========================================

#[test]
fn test_finalized_工程不可修改() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let work = api.create(fx.work_input(3001)).unwrap();

    api.change_state(&work.record.id, &fx.finalizada.record.id)
        .expect("进入终态失败");

    let err = api.update(&work.record.id, fx.work_input(3001)).unwrap_err();
    assert!(matches!(err, ApiError::Finalized(_)), "实际错误: {:?}", err);

    let err = api
        .change_state(&work.record.id, &fx.ejecucion.record.id)
        .unwrap_err();
    assert!(matches!(err, ApiError::Finalized(_)), "实际错误: {:?}", err);

    // 终态判定不区分大小写，历史保持不变
    assert_eq!(api.list_history(&work.record.id).unwrap().len(), 2);
}

#[test]
fn test_finalized_工程仍可停用() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let work = api.create(fx.work_input(3002)).unwrap();
    api.change_state(&work.record.id, &fx.finalizada.record.id).unwrap();

    api.deactivate(&work.record.id).expect("终态工程应可停用");
    assert!(api.get_active(&work.record.id).is_err());
}

// ==========================================
// 校验
// ==========================================

#[test]
fn test_create_字段校验() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;

    let mut input = fx.work_input(1);
    input.execution_duration = Some(0);
    assert!(matches!(api.create(input), Err(ApiError::ValidationError(_))));

    let mut input = fx.work_input(1);
    input.execution_year = Some(1999);
    assert!(matches!(api.create(input), Err(ApiError::ValidationError(_))));

    let mut input = fx.work_input(1);
    input.final_investment = Some(Decimal::ZERO);
    assert!(matches!(api.create(input), Err(ApiError::ValidationError(_))));

    let mut input = fx.work_input(1);
    input.name = Some("   ".to_string());
    assert!(matches!(api.create(input), Err(ApiError::ValidationError(_))));

    let mut input = fx.work_input(1);
    input.start_date = None;
    assert!(matches!(api.create(input), Err(ApiError::ValidationError(_))));

    // 所有失败均无副作用
    assert!(api.list_all().unwrap().is_empty());
}

#[test]
fn test_create_工程编号冲突() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let first = api.create(fx.work_input(42)).unwrap();

    let err = api.create(fx.work_input(42)).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)), "实际错误: {:?}", err);

    // 更新自身编号不冲突
    api.update(&first.record.id, fx.work_input(42)).expect("更新自身不应冲突");

    // 停用后编号可复用
    api.deactivate(&first.record.id).unwrap();
    api.create(fx.work_input(42)).expect("停用后的编号应可复用");
}

#[test]
fn test_create_引用校验() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;

    let mut input = fx.work_input(1);
    input.locality_id = Some("missing".to_string());
    assert!(matches!(api.create(input), Err(ApiError::NotFound(_))));

    let mut input = fx.work_input(1);
    input.plan_id = Some("missing".to_string());
    assert!(matches!(api.create(input), Err(ApiError::InvalidPlan(_))));

    let mut input = fx.work_input(1);
    input.risk_ids = Some(vec!["missing".to_string()]);
    assert!(matches!(api.create(input), Err(ApiError::InvalidRisk(_))));

    // 已停用的计划同样无效
    let plan = fx.env.plan("Retired", &fx.rubro);
    fx.env.state.plan_api.deactivate(&plan.record.id).unwrap();
    let mut input = fx.work_input(1);
    input.plan_id = Some(plan.record.id.clone());
    assert!(matches!(api.create(input), Err(ApiError::InvalidPlan(_))));

    assert!(api.list_all().unwrap().is_empty());
}

#[test]
fn test_change_state_目标状态无效() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let work = api.create(fx.work_input(1)).unwrap();

    let err = api.change_state(&work.record.id, "missing").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api.change_state("missing", &fx.ejecucion.record.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert_eq!(api.list_history(&work.record.id).unwrap().len(), 1);
}

// ==========================================
// 已停用工程
// ==========================================

#[test]
fn test_deactivated_工程拒绝写操作() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let work = api.create(fx.work_input(5)).unwrap();
    api.deactivate(&work.record.id).unwrap();

    let err = api.update(&work.record.id, fx.work_input(5)).unwrap_err();
    assert!(matches!(err, ApiError::Deactivated(_)), "实际错误: {:?}", err);

    let err = api
        .change_state(&work.record.id, &fx.ejecucion.record.id)
        .unwrap_err();
    assert!(matches!(err, ApiError::Deactivated(_)), "实际错误: {:?}", err);

    let err = api.deactivate(&work.record.id).unwrap_err();
    assert!(matches!(err, ApiError::Deactivated(_)), "实际错误: {:?}", err);

    // 历史读取仍然可用
    assert_eq!(api.get_any(&work.record.id).unwrap().work_number, 5);
}
