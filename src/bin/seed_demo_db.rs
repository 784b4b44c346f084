// ==========================================
// 公共工程管理系统 - 演示数据初始化
// ==========================================
// 用法: seed_demo_db [数据库路径]
// 已存在的数据库先备份再重建；所有数据经 API 写入，保证不变量成立
// ==========================================

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::error::Error;
use std::fs;
use std::path::Path;

use gestion_obras::api::{
    CatalogNameInput, DepartmentInput, LocalityInput, PlanInput, RiskInput,
};
use gestion_obras::app::{get_default_db_path, AppState};
use gestion_obras::domain::{Priority, WorkInput};

fn main() -> Result<(), Box<dyn Error>> {
    gestion_obras::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    seed(&state)?;

    let snapshot = state.dashboard_api.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    eprintln!("Seeded {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed(state: &AppState) -> Result<(), Box<dyn Error>> {
    // 部门 / 地区
    let new_york = state.department_api.create(DepartmentInput {
        name: "New York State".to_string(),
    })?;
    let nevada = state.department_api.create(DepartmentInput {
        name: "Nevada".to_string(),
    })?;

    let nyc = state.locality_api.create(LocalityInput {
        name: "NYC".to_string(),
        department_id: new_york.record.id.clone(),
    })?;
    state.locality_api.create(LocalityInput {
        name: "Buffalo".to_string(),
        department_id: new_york.record.id.clone(),
    })?;
    let las_vegas = state.locality_api.create(LocalityInput {
        name: "Las Vegas".to_string(),
        department_id: nevada.record.id.clone(),
    })?;

    // 执行状态
    let api = &state.execution_state_api;
    api.create(CatalogNameInput::named("Planificacion"))?;
    let ejecucion = api.create(CatalogNameInput::named("Ejecucion"))?;
    api.create(CatalogNameInput::named("Finalizada"))?;

    // 行业类别
    let infraestructura = state.rubro_api.create(CatalogNameInput::named("Infraestructura"))?;
    let turismo = state.rubro_api.create(CatalogNameInput::named("Turismo"))?;

    // 项目计划
    let plan = |name: &str, priority: Priority, rubro: &str, investment: i64, study: i32, duration: i32| {
        PlanInput {
            name: name.to_string(),
            description: Some(format!("{} (demo)", name)),
            study_months: Some(study),
            estimated_investment: Some(Decimal::new(investment, 0)),
            estimated_duration: Some(duration),
            priority: Some(priority),
            rubro_id: rubro.to_string(),
        }
    };
    let p1 = state.plan_api.create(plan(
        "Statue Renovation Plan",
        Priority::Uno,
        &turismo.record.id,
        320_000,
        4,
        8,
    ))?;
    let p2 = state.plan_api.create(plan(
        "Monorail Expansion Plan",
        Priority::Dos,
        &infraestructura.record.id,
        420_000,
        5,
        12,
    ))?;
    state.plan_api.create(plan(
        "City Park Improvement",
        Priority::Tres,
        &turismo.record.id,
        150_000,
        3,
        7,
    ))?;
    state.plan_api.create(plan(
        "Highway Repair Plan",
        Priority::Cuatro,
        &infraestructura.record.id,
        200_000,
        2,
        6,
    ))?;

    // 技术风险
    let risk = |number: i64, nature: &str, solution: &str, mitigation: &str| RiskInput {
        risk_number: Some(number),
        nature: nature.to_string(),
        proposed_solution: Some(solution.to_string()),
        mitigation_measures: Some(mitigation.to_string()),
        actions_taken: None,
    };
    let ambiental = state.risk_api.create(risk(
        1,
        "Ambiental",
        "Estudio de impacto ambiental",
        "Monitoreo continuo de emisiones",
    ))?;
    state.risk_api.create(risk(
        2,
        "Estructural",
        "Refuerzo de la estructura existente",
        "Inspecciones periodicas",
    ))?;
    state.risk_api.create(risk(
        3,
        "Financiero",
        "Fondo de contingencia",
        "Revision trimestral del presupuesto",
    ))?;

    // 工程
    let statue = state.work_api.create(WorkInput {
        work_number: Some(2001),
        name: Some("Statue of Liberty Renovation".to_string()),
        execution_duration: Some(6),
        execution_year: Some(2024),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        end_date: None,
        final_investment: Some(Decimal::new(300_000, 0)),
        locality_id: Some(nyc.record.id.clone()),
        plan_id: Some(p1.record.id.clone()),
        risk_ids: Some(vec![ambiental.record.id.clone()]),
    })?;
    state.work_api.create(WorkInput {
        work_number: Some(2002),
        name: Some("Las Vegas Monorail Extension".to_string()),
        execution_duration: Some(12),
        execution_year: Some(2025),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 15),
        end_date: None,
        final_investment: Some(Decimal::new(400_000, 0)),
        locality_id: Some(las_vegas.record.id.clone()),
        plan_id: Some(p2.record.id.clone()),
        risk_ids: None,
    })?;

    state
        .work_api
        .change_state(&statue.record.id, &ejecucion.record.id)?;

    Ok(())
}
