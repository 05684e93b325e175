use axum::body::to_bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use obra_engine::api::{
    estimate_handler, get_template_handler, list_presets_handler, list_submissions_handler,
    pila_handler, update_status_handler, AppState, EstimateRequest, PilaRequest, StatusUpdate,
    SubmissionQuery,
};
use obra_engine::catalog::{InMemoryCatalog, BUILTIN_TEMPLATE_ID};
use obra_engine::models::{ArlRiskClass, CostCategory, Employee, EstimationItem, SubmissionStatus};
use obra_engine::personnel::PersonnelRecord;
use serde_json::Value;
use std::sync::Arc;

fn state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(InMemoryCatalog::builtin()), ArlRiskClass::V))
}

async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn employee(id: &str, salary: f64) -> Employee {
    Employee {
        id: id.into(),
        document_number: format!("10{id}"),
        name: format!("Trabajador {id}"),
        position: "Ayudante".into(),
        salary,
    }
}

fn pila_request(period: &str, employees: Vec<Employee>) -> PilaRequest {
    PilaRequest {
        period: period.into(),
        employees,
        personnel: Vec::new(),
        arl_class: None,
    }
}

#[tokio::test]
async fn estimate_reports_unresolved_items() {
    let req = EstimateRequest {
        template_id: BUILTIN_TEMPLATE_ID.into(),
        items: vec![
            EstimationItem::new(CostCategory::Materials, "cemento", 10.0),
            EstimationItem::new(CostCategory::Materials, "marmol", 3.0),
        ],
        duration_days: 10.0,
        apply_benefits: false,
        factors: None,
    };
    let resp = estimate_handler(State(state()), Json(req)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["breakdown"]["materials"], 320_000.0);
    assert_eq!(body["unresolved"][0]["index"], 1);
    assert_eq!(body["unresolved"][0]["subcategory"], "marmol");
}

#[tokio::test]
async fn estimate_unknown_template_is_404() {
    let req = EstimateRequest {
        template_id: "nope".into(),
        items: Vec::new(),
        duration_days: 10.0,
        apply_benefits: false,
        factors: None,
    };
    let resp = estimate_handler(State(state()), Json(req)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn estimate_zero_duration_is_400() {
    let req = EstimateRequest {
        template_id: BUILTIN_TEMPLATE_ID.into(),
        items: Vec::new(),
        duration_days: 0.0,
        apply_benefits: true,
        factors: None,
    };
    let resp = estimate_handler(State(state()), Json(req)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn estimate_overflow_is_400() {
    let req = EstimateRequest {
        template_id: BUILTIN_TEMPLATE_ID.into(),
        items: vec![EstimationItem::new(CostCategory::Materials, "cemento", 1e305)],
        duration_days: 30.0,
        apply_benefits: false,
        factors: None,
    };
    let resp = estimate_handler(State(state()), Json(req)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn template_and_presets_lookup() {
    let st = state();
    let resp = get_template_handler(State(st.clone()), Path(BUILTIN_TEMPLATE_ID.to_string())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = list_presets_handler(State(st.clone()), Path(BUILTIN_TEMPLATE_ID.to_string())).await;
    let presets = body_json(resp).await;
    assert_eq!(presets.as_array().unwrap().len(), 1);
    let resp = list_presets_handler(State(st), Path("missing".to_string())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pila_submission_lifecycle() {
    let st = state();
    let resp = pila_handler(
        State(st.clone()),
        Json(pila_request("2025-08", vec![employee("1", 2_500_000.0)])),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["total_contributions"], 686_500.0);
    assert_eq!(created["status"], "GENERADO");
    let id = created["id"].as_str().unwrap().to_string();

    let resp = list_submissions_handler(
        State(st.clone()),
        Query(SubmissionQuery {
            period: Some("2025-08".into()),
        }),
    )
    .await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

    let resp = update_status_handler(
        State(st.clone()),
        Path(id.clone()),
        Json(StatusUpdate {
            status: SubmissionStatus::Enviado,
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ENVIADO");

    let resp = update_status_handler(
        State(st),
        Path(id),
        Json(StatusUpdate {
            status: SubmissionStatus::Generado,
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pila_rejects_empty_employee_list() {
    let st = state();
    let resp = pila_handler(State(st.clone()), Json(pila_request("2025-08", Vec::new()))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = list_submissions_handler(State(st), Query(SubmissionQuery { period: None })).await;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn pila_resolves_personnel_records() {
    let mut req = pila_request("2025-09", Vec::new());
    req.personnel = vec![
        PersonnelRecord {
            id: "h1".into(),
            document_number: String::new(),
            name: String::new(),
            position: String::new(),
            monthly_salary: None,
            hourly_rate: Some(10_000.0),
            active: true,
        },
        PersonnelRecord {
            id: "x".into(),
            document_number: String::new(),
            name: String::new(),
            position: String::new(),
            monthly_salary: Some(9_000_000.0),
            hourly_rate: None,
            active: false,
        },
    ];
    req.arl_class = Some(ArlRiskClass::I);
    let resp = pila_handler(State(state()), Json(req)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["employee_count"], 1);
    assert_eq!(body["total_salary"], 1_920_000.0);
    assert_eq!(body["arl_class"], "I");
}
