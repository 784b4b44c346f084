// ==========================================
// 计划执行标志集成测试
// ==========================================
// 测试范围:
// 1. in_execution 与有效工程引用数保持一致
// 2. 工程改挂计划（事务内先解除后挂接）
// 3. 执行中的计划禁止修改/停用
// 4. 启动时修复漂移的标志
// ==========================================


use gestion_obras::api::ApiError;
use gestion_obras::app::AppState;
use gestion_obras::db::lock_conn;
use gestion_obras::engine::PlanExecutionTracker;
use test_helpers::{plan_input, Fixture};

fn in_execution(fx: &Fixture, plan_id: &str) -> bool {
    fx.env
        .state
        .plan_api
        .get_any(plan_id)
        .expect("读取计划失败")
        .in_execution
}

#[test]
fn test_flag_随引用数变化() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let plan = fx.env.plan("Monorail Expansion Plan", &fx.rubro);

    let mut input = fx.work_input(1);
    input.plan_id = Some(plan.record.id.clone());
    let w1 = api.create(input).unwrap();
    assert!(in_execution(&fx, &plan.record.id));

    let mut input = fx.work_input(2);
    input.plan_id = Some(plan.record.id.clone());
    let w2 = api.create(input).unwrap();

    // 仍有一个引用时保持 true
    api.deactivate(&w1.record.id).unwrap();
    assert!(in_execution(&fx, &plan.record.id));

    // 最后一个引用解除后回到 false
    api.update(&w2.record.id, fx.work_input(2)).unwrap();
    assert!(!in_execution(&fx, &plan.record.id));
}

#[test]
fn test_reassign_改挂计划() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let p1 = fx.env.plan("P1", &fx.rubro);
    let p2 = fx.env.plan("P2", &fx.rubro);

    let mut input = fx.work_input(10);
    input.plan_id = Some(p1.record.id.clone());
    let work = api.create(input).unwrap();

    let mut input = fx.work_input(10);
    input.plan_id = Some(p2.record.id.clone());
    api.update(&work.record.id, input).unwrap();

    assert!(!in_execution(&fx, &p1.record.id));
    assert!(in_execution(&fx, &p2.record.id));

    // 重复指向同一计划不改变标志
    let mut input = fx.work_input(10);
    input.plan_id = Some(p2.record.id.clone());
    api.update(&work.record.id, input).unwrap();
    assert!(in_execution(&fx, &p2.record.id));
}

#[test]
fn test_reassign_目标无效时不修改原计划() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let p1 = fx.env.plan("P1", &fx.rubro);

    let mut input = fx.work_input(11);
    input.plan_id = Some(p1.record.id.clone());
    let work = api.create(input).unwrap();

    let mut input = fx.work_input(11);
    input.plan_id = Some("missing".to_string());
    let err = api.update(&work.record.id, input).unwrap_err();
    assert!(matches!(err, ApiError::InvalidPlan(_)), "实际错误: {:?}", err);

    assert!(in_execution(&fx, &p1.record.id));
    assert_eq!(
        api.get_active(&work.record.id).unwrap().plan_id.as_deref(),
        Some(p1.record.id.as_str())
    );
}

#[test]
fn test_plan_执行中禁止修改和停用() {
    let fx = Fixture::new();
    let plan_api = &fx.env.state.plan_api;
    let plan = fx.env.plan("Highway Repair Plan", &fx.rubro);

    let mut input = fx.work_input(20);
    input.plan_id = Some(plan.record.id.clone());
    let work = fx.env.state.work_api.create(input).unwrap();

    let err = plan_api
        .update(&plan.record.id, plan_input("Renamed", &fx.rubro))
        .unwrap_err();
    assert!(matches!(err, ApiError::InUse(_)), "实际错误: {:?}", err);

    let err = plan_api.deactivate(&plan.record.id).unwrap_err();
    assert!(matches!(err, ApiError::InUse(_)), "实际错误: {:?}", err);

    // 工程停用后计划恢复可修改、可停用
    fx.env.state.work_api.deactivate(&work.record.id).unwrap();
    let renamed = plan_api
        .update(&plan.record.id, plan_input("Renamed", &fx.rubro))
        .expect("计划应可修改");
    assert_eq!(renamed.name, "Renamed");
    plan_api.deactivate(&plan.record.id).expect("计划应可停用");
    assert!(!in_execution(&fx, &plan.record.id));
}

#[test]
fn test_reconcile_all_修复漂移() {
    let fx = Fixture::new();
    let idle = fx.env.plan("Idle", &fx.rubro);
    let busy = fx.env.plan("Busy", &fx.rubro);

    let mut input = fx.work_input(30);
    input.plan_id = Some(busy.record.id.clone());
    fx.env.state.work_api.create(input).unwrap();

    // 人为制造漂移
    {
        let conn = lock_conn(&fx.env.state.conn).unwrap();
        conn.execute(
            "UPDATE project_plan SET in_execution = 1 WHERE id = ?1",
            [&idle.record.id],
        )
        .unwrap();
        conn.execute(
            "UPDATE project_plan SET in_execution = 0 WHERE id = ?1",
            [&busy.record.id],
        )
        .unwrap();
    }

    let drifts = {
        let conn = lock_conn(&fx.env.state.conn).unwrap();
        PlanExecutionTracker::reconcile_all(&conn).unwrap()
    };
    assert_eq!(drifts.len(), 2);
    assert!(!in_execution(&fx, &idle.record.id));
    assert!(in_execution(&fx, &busy.record.id));

    // 再次执行无漂移
    let conn = lock_conn(&fx.env.state.conn).unwrap();
    assert!(PlanExecutionTracker::reconcile_all(&conn).unwrap().is_empty());
}

#[test]
fn test_reconcile_启动时自动修复() {
    let fx = Fixture::new();
    let idle = fx.env.plan("Idle", &fx.rubro);
    {
        let conn = lock_conn(&fx.env.state.conn).unwrap();
        conn.execute(
            "UPDATE project_plan SET in_execution = 1 WHERE id = ?1",
            [&idle.record.id],
        )
        .unwrap();
    }

    let reopened = AppState::new(fx.env.db_path.clone()).expect("重新打开失败");
    assert!(!reopened.plan_api.get_active(&idle.record.id).unwrap().in_execution);
}

#[test]
fn test_plan_最后引用解除后可停用且标志为false() {
    let fx = Fixture::new();
    let api = &fx.env.state.work_api;
    let plan_api = &fx.env.state.plan_api;
    let plan = fx.env.plan("Highway Repair Plan", &fx.rubro);

    let mut input = fx.work_input(30);
    input.plan_id = Some(plan.record.id.clone());
    let work = api.create(input).unwrap();
    assert!(in_execution(&fx, &plan.record.id));

    // 解除最后一个引用
    api.update(&work.record.id, fx.work_input(30)).unwrap();
    assert!(!in_execution(&fx, &plan.record.id));

    plan_api.deactivate(&plan.record.id).unwrap();

    let stored = plan_api.get_any(&plan.record.id).unwrap();
    assert!(!stored.record.is_active());
    assert!(!stored.in_execution);
}
