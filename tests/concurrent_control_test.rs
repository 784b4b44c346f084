// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证同一工程的并发写操作串行化
// - 并发状态迁移后始终只有一条未关闭记录
// - 并发挂接/解除后计划标志与引用数一致
// ==========================================


use std::sync::Arc;
use std::thread;

use gestion_obras::db::lock_conn;
use gestion_obras::repository::{WorkRepository, WorkStateRepository};
use test_helpers::Fixture;

#[test]
fn test_concurrent_change_state_单一未关闭记录() {
    let fx = Fixture::new();
    let work = fx.env.state.work_api.create(fx.work_input(1)).unwrap();
    let work_id = Arc::new(work.record.id.clone());

    let targets = [
        fx.ejecucion.record.id.clone(),
        fx.planificacion.record.id.clone(),
    ];

    let mut handles = Vec::new();
    for i in 0..8 {
        let api = Arc::clone(&fx.env.state.work_api);
        let work_id = Arc::clone(&work_id);
        let state_id = targets[i % targets.len()].clone();
        handles.push(thread::spawn(move || {
            for _ in 0..5 {
                api.change_state(&work_id, &state_id).expect("状态迁移失败");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("线程异常退出");
    }

    let conn = lock_conn(&fx.env.state.conn).unwrap();
    assert_eq!(WorkStateRepository::count_open(&conn, &work_id).unwrap(), 1);
    // 初始记录 + 40 次迁移
    assert_eq!(WorkStateRepository::history(&conn, &work_id).unwrap().len(), 41);
}

#[test]
fn test_concurrent_plan_assignment_标志一致() {
    let fx = Fixture::new();
    let plan = fx.env.plan("Monorail Expansion Plan", &fx.rubro);

    let mut works = Vec::new();
    for number in 1..=6 {
        works.push(fx.env.state.work_api.create(fx.work_input(number)).unwrap());
    }

    let mut handles = Vec::new();
    for (i, work) in works.into_iter().enumerate() {
        let api = Arc::clone(&fx.env.state.work_api);
        let mut attach = fx.work_input(i as i64 + 1);
        attach.plan_id = Some(plan.record.id.clone());
        let detach = fx.work_input(i as i64 + 1);
        handles.push(thread::spawn(move || {
            api.update(&work.record.id, attach).expect("挂接失败");
            // 偶数号工程随后解除
            if i % 2 == 0 {
                api.update(&work.record.id, detach).expect("解除失败");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("线程异常退出");
    }

    let conn = lock_conn(&fx.env.state.conn).unwrap();
    let referencing = WorkRepository::count_active_by_plan(&conn, &plan.record.id).unwrap();
    assert_eq!(referencing, 3);
    drop(conn);
    assert!(fx.env.state.plan_api.get_active(&plan.record.id).unwrap().in_execution);
}
