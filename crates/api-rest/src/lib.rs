//! # API REST
//!
//! REST API implementation for OptiNote.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Uses `api-shared` for wire types and `optinote-core` for everything else.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    CodeRecordRes, CodeSearchRes, ConditionRes, ErrorRes, FormatSoapReq, FormatSoapRes,
    GenerateNoteReq, GenerateNoteRes, GroupRes, HealthRes, HealthService, ListConditionsRes,
};
use optinote_core::{
    constants::PATIENT_REF_FIELD, CodeSearch, Condition, ConditionCatalogue, CoreConfig,
    CoreError, NoteFields, NoteGenerator, NoteHeader, ToggleState,
};
use optinote_soap::{SoapError, SoapFormatter};

const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

fn core_error(e: CoreError) -> ApiError {
    let status = match &e {
        CoreError::UnknownCondition(_)
        | CoreError::UnknownGroup { .. }
        | CoreError::InvalidGroupValue { .. }
        | CoreError::ToggleScopeMismatch { .. }
        | CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CoreError::CatalogueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::CatalogueRead(_)
        | CoreError::CatalogueParse(_)
        | CoreError::ConditionSchema(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Core error: {:?}", e);
    }
    api_error(status, e.to_string())
}

fn soap_error(e: SoapError) -> ApiError {
    let status = match &e {
        SoapError::EmptyInput | SoapError::MissingApiKey => StatusCode::BAD_REQUEST,
        SoapError::Provider { .. } | SoapError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::error!("SOAP formatting error: {}", e);
    }
    api_error(status, e.to_string())
}

/// Application state shared across REST API handlers
///
/// Catalogues are loaded once at startup and are read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    notes: NoteGenerator,
    search: Arc<CodeSearch>,
    soap: SoapFormatter,
}

impl AppState {
    pub fn new(
        cfg: CoreConfig,
        catalogue: ConditionCatalogue,
        search: CodeSearch,
        soap: SoapFormatter,
    ) -> Self {
        Self {
            cfg: Arc::new(cfg),
            notes: NoteGenerator::new(Arc::new(catalogue)),
            search: Arc::new(search),
            soap,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_conditions,
        get_condition,
        generate_note,
        search_codes,
        format_soap,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        GroupRes,
        ConditionRes,
        ListConditionsRes,
        GenerateNoteReq,
        GenerateNoteRes,
        CodeRecordRes,
        CodeSearchRes,
        FormatSoapReq,
        FormatSoapRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/conditions", get(list_conditions))
        .route("/conditions/:condition", get(get_condition))
        .route("/notes", post(generate_note))
        .route("/codes/search", get(search_codes))
        .route("/soap", post(format_soap))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/conditions",
    responses(
        (status = 200, description = "Every condition with its fields and toggle groups", body = ListConditionsRes)
    )
)]
#[axum::debug_handler]
async fn list_conditions(State(state): State<AppState>) -> Json<ListConditionsRes> {
    let conditions = state
        .notes
        .catalogue()
        .schemas()
        .map(ConditionRes::from)
        .collect();
    Json(ListConditionsRes { conditions })
}

#[utoipa::path(
    get,
    path = "/conditions/{condition}",
    params(("condition" = String, Path, description = "Condition tag: DR, AMD, Glaucoma, ROP or Cataract")),
    responses(
        (status = 200, description = "Condition schema", body = ConditionRes),
        (status = 404, description = "Unknown condition", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_condition(
    State(state): State<AppState>,
    AxumPath(condition): AxumPath<String>,
) -> Result<Json<ConditionRes>, ApiError> {
    let condition = Condition::parse(&condition)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(Json(ConditionRes::from(
        state.notes.catalogue().schema(condition),
    )))
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = GenerateNoteReq,
    responses(
        (status = 200, description = "Generated clinical note", body = GenerateNoteRes),
        (status = 400, description = "Unknown condition, group or value, or a malformed date", body = ErrorRes)
    )
)]
/// Generate a clinical note
///
/// Groups omitted from `toggles` take their defaults. The clinician and department lines come
/// from the server's settings; a missing or blank `patient_ref` falls back to the `patient_ref`
/// field.
#[axum::debug_handler]
async fn generate_note(
    State(state): State<AppState>,
    Json(req): Json<GenerateNoteReq>,
) -> Result<Json<GenerateNoteRes>, ApiError> {
    let condition = Condition::parse(&req.condition).map_err(core_error)?;
    let toggles = ToggleState::from_selections(state.notes.catalogue(), condition, &req.toggles)
        .map_err(core_error)?;
    let fields: NoteFields = req.fields.into_iter().collect();

    let date = match req.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, REQUEST_DATE_FORMAT).map_err(|_| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("date must be YYYY-MM-DD, got {d:?}"),
            )
        })?,
        None => chrono::Local::now().date_naive(),
    };
    let patient_ref = req
        .patient_ref
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .or_else(|| fields.get(PATIENT_REF_FIELD));
    let header = NoteHeader::compose(date, patient_ref, state.cfg.settings());

    let note = state
        .notes
        .generate(condition, &fields, &toggles, &header)
        .map_err(core_error)?;
    Ok(Json(GenerateNoteRes::from(&note)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct SearchParams {
    /// Free-text symptom or condition name.
    #[serde(default)]
    q: String,
}

#[utoipa::path(
    get,
    path = "/codes/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Up to 12 matching ICD-10 codes", body = CodeSearchRes),
        (status = 503, description = "Code catalogue unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn search_codes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CodeSearchRes>, ApiError> {
    let results = state.search.search(&params.q).map_err(core_error)?;
    Ok(Json(CodeSearchRes::from(&results)))
}

#[utoipa::path(
    post,
    path = "/soap",
    request_body = FormatSoapReq,
    responses(
        (status = 200, description = "SOAP-formatted note", body = FormatSoapRes),
        (status = 400, description = "Empty input or no API key configured", body = ErrorRes),
        (status = 502, description = "Provider or transport failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn format_soap(
    State(state): State<AppState>,
    Json(req): Json<FormatSoapReq>,
) -> Result<Json<FormatSoapRes>, ApiError> {
    let soap = state
        .soap
        .format(
            &req.input,
            req.context.as_deref(),
            state.cfg.settings().api_key.as_ref(),
        )
        .await
        .map_err(soap_error)?;
    Ok(Json(FormatSoapRes { soap }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use optinote_core::{ClinicianSettings, CodeCatalogue};
    use optinote_soap::SoapConfig;
    use std::path::PathBuf;
    use tower::ServiceExt;

    const FIXTURE: &str = r#"{
        "conditions": {
            "Glaucoma": [
                { "code": "H40.11", "description": "Primary open-angle glaucoma" },
                { "code": "H40.20", "description": "Unspecified primary angle-closure glaucoma" }
            ]
        },
        "symptoms": {
            "blurred vision": [
                { "code": "H53.8", "description": "Other visual disturbances" }
            ]
        }
    }"#;

    fn state_with(search: CodeSearch) -> AppState {
        let settings = ClinicianSettings::from_values(
            Some("Dr S. Iyer".into()),
            Some("Eye Unit".into()),
            None,
        );
        AppState::new(
            CoreConfig::new(PathBuf::from("unused.json"), settings),
            ConditionCatalogue::builtin().unwrap(),
            search,
            SoapFormatter::new(SoapConfig::default()).unwrap(),
        )
    }

    fn app() -> Router {
        router(state_with(CodeSearch::new(
            CodeCatalogue::from_json_str(FIXTURE).unwrap(),
        )))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, json) = send(app(), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn lists_all_five_conditions_in_order() {
        let (status, json) = send(app(), get_req("/conditions")).await;
        assert_eq!(status, StatusCode::OK);
        let tags: Vec<&str> = json["conditions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["condition"].as_str().unwrap())
            .collect();
        assert_eq!(tags, ["DR", "AMD", "Glaucoma", "ROP", "Cataract"]);
    }

    #[tokio::test]
    async fn unknown_condition_schema_is_not_found() {
        let (status, _) = send(app(), get_req("/conditions/Keratoconus")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generates_note_with_settings_header() {
        let body = serde_json::json!({
            "condition": "Cataract",
            "fields": { "patient_ref": "MRN-9", "va_snellen": "6/36" },
            "toggles": { "cat_grade": "Grade 4" },
            "date": "2026-10-19"
        });
        let (status, json) = send(app(), post_json("/notes", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["header"],
            serde_json::json!([
                "Date: 19 Oct 2026",
                "Patient ref: MRN-9",
                "Clinician: Dr S. Iyer",
                "Department: Eye Unit"
            ])
        );
        assert_eq!(
            json["plan"][0],
            "Surgical referral for phacoemulsification + IOL"
        );
        assert!(json["text"]
            .as_str()
            .unwrap()
            .starts_with("CATARACT — CLINICAL NOTE\n"));
    }

    #[tokio::test]
    async fn blank_patient_ref_falls_back_to_field() {
        let body = serde_json::json!({
            "condition": "Cataract",
            "patient_ref": "   ",
            "fields": { "patient_ref": "MRN-9" },
            "date": "2026-10-19"
        });
        let (status, json) = send(app(), post_json("/notes", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["header"][1], "Patient ref: MRN-9");
    }

    #[tokio::test]
    async fn invalid_toggle_value_is_bad_request() {
        let body = serde_json::json!({
            "condition": "ROP",
            "toggles": { "rop_zone": "Zone IV" }
        });
        let (status, json) = send(app(), post_json("/notes", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("Zone IV"));
    }

    #[tokio::test]
    async fn unknown_note_condition_and_bad_date_are_bad_requests() {
        let (status, _) = send(
            app(),
            post_json("/notes", serde_json::json!({ "condition": "dr" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(),
            post_json(
                "/notes",
                serde_json::json!({ "condition": "DR", "date": "19/10/2026" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_returns_matches_and_message() {
        let (status, json) = send(app(), get_req("/codes/search?q=glaucoma")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["records"][0]["code"], "H40.11");
        assert_eq!(json["records"][0]["condition"], "Glaucoma");
        assert_eq!(json["truncated"], false);
        assert!(json.get("message").is_none());

        let (status, json) = send(app(), get_req("/codes/search?q=xyzzy")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["records"], serde_json::json!([]));
        assert!(json["message"].as_str().unwrap().starts_with("No results"));
    }

    #[tokio::test]
    async fn search_without_catalogue_is_unavailable() {
        let app = router(state_with(CodeSearch::unavailable("file not found")));
        let (status, _) = send(app, get_req("/codes/search?q=glaucoma")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn soap_guards_map_to_bad_request() {
        let (status, json) = send(
            app(),
            post_json("/soap", serde_json::json!({ "input": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Please enter some clinical notes to format.");

        let (status, _) = send(
            app(),
            post_json("/soap", serde_json::json!({ "input": "IOP 26 OD" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (status, json) = send(app(), get_req("/api-docs/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["paths"].get("/notes").is_some());
    }
}
