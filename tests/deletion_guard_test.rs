// ==========================================
// 停用守卫集成测试
// ==========================================
// 职责: 验证存在有效依赖时停用被拒绝（InUse），依赖解除后可停用
// ==========================================


use gestion_obras::api::ApiError;
use test_helpers::Fixture;

fn assert_in_use<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    match result {
        Err(ApiError::InUse(_)) => {}
        other => panic!("期望 InUse，实际: {:?}", other),
    }
}

#[test]
fn test_rubro_有效计划时拒绝停用() {
    let fx = Fixture::new();
    let plan = fx.env.plan("Statue Renovation Plan", &fx.rubro);

    assert_in_use(fx.env.state.rubro_api.deactivate(&fx.rubro.record.id));
    assert!(fx.env.state.rubro_api.get_active(&fx.rubro.record.id).is_ok());

    fx.env.state.plan_api.deactivate(&plan.record.id).unwrap();
    fx.env
        .state
        .rubro_api
        .deactivate(&fx.rubro.record.id)
        .expect("计划停用后行业类别应可停用");
}

#[test]
fn test_department_有效地区时拒绝停用() {
    let fx = Fixture::new();

    assert_in_use(fx.env.state.department_api.deactivate(&fx.department.record.id));

    fx.env.state.locality_api.deactivate(&fx.locality.record.id).unwrap();
    fx.env
        .state
        .department_api
        .deactivate(&fx.department.record.id)
        .expect("地区停用后部门应可停用");
}

#[test]
fn test_execution_state_有工程处于该状态时拒绝停用() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let work = api.create(fx.work_input(1)).unwrap();
    api.change_state(&work.record.id, &fx.ejecucion.record.id).unwrap();

    assert_in_use(fx.env.state.execution_state_api.deactivate(&fx.ejecucion.record.id));

    // 已关闭的历史记录不构成依赖
    fx.env
        .state
        .execution_state_api
        .deactivate(&fx.planificacion.record.id)
        .expect("仅历史引用的状态应可停用");

    // 工程停用后其未关闭记录不再计入
    api.deactivate(&work.record.id).unwrap();
    fx.env
        .state
        .execution_state_api
        .deactivate(&fx.ejecucion.record.id)
        .expect("工程停用后状态应可停用");
}

#[test]
fn test_risk_关联有效工程时拒绝停用() {
    let fx = Fixture::new();
    let risk = fx.env.risk(1, "Ambiental");
    let api = &fx.env.state.work_api;

    let mut input = fx.work_input(1);
    input.risk_ids = Some(vec![risk.record.id.clone()]);
    let work = api.create(input).unwrap();

    assert_in_use(fx.env.state.risk_api.deactivate(&risk.record.id));

    let mut input = fx.work_input(1);
    input.risk_ids = Some(Vec::new());
    api.update(&work.record.id, input).unwrap();
    fx.env
        .state
        .risk_api
        .deactivate(&risk.record.id)
        .expect("解除关联后风险应可停用");
}

#[test]
fn test_deactivate_不存在与重复停用() {
    let fx = Fixture::new();
    let api = &fx.env.state.rubro_api;

    assert!(matches!(api.deactivate("missing"), Err(ApiError::NotFound(_))));

    let spare = fx.env.rubro("Infraestructura");
    api.deactivate(&spare.record.id).unwrap();
    assert!(matches!(
        api.deactivate(&spare.record.id),
        Err(ApiError::Deactivated(_))
    ));

    // 停用记录仍可按 id 读取
    let stored = api.get_any(&spare.record.id).unwrap();
    assert!(stored.record.deactivated_at.is_some());
    assert!(api.get_active(&spare.record.id).is_err());
}
