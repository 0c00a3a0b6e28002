use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use optinote_core::{
    constants::CODE_CATALOGUE_PATH, resolve_code_catalogue_path, ClinicianSettings, CodeSearch,
    ConditionCatalogue, CoreConfig,
};
use optinote_soap::{SoapConfig, SoapFormatter};

/// Main entry point for the OptiNote service
///
/// Loads the catalogues once, then serves the REST API with Swagger UI.
///
/// # Environment Variables
/// - `OPTINOTE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OPTINOTE_CODE_CATALOGUE`: ICD-10 catalogue JSON (default: bundled `data/icd10_ophthalmic.json`)
/// - `OPTINOTE_CLINICIAN_NAME`, `OPTINOTE_DEPARTMENT`: optional note header lines
/// - `GROQ_API_KEY`: enables `/soap`
/// - `OPTINOTE_SOAP_ENDPOINT`, `OPTINOTE_SOAP_MODEL`: chat-completions overrides
///
/// A missing code catalogue does not stop startup; searches report it as unavailable.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the built-in condition catalogue is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("optinote=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("OPTINOTE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let catalogue_override = std::env::var("OPTINOTE_CODE_CATALOGUE")
        .ok()
        .map(PathBuf::from);
    let (catalogue_path, search) = match resolve_code_catalogue_path(catalogue_override) {
        Ok(path) => {
            let search = CodeSearch::load(&path);
            (path, search)
        }
        Err(e) => {
            tracing::warn!("code search disabled: {}", e);
            (
                PathBuf::from(CODE_CATALOGUE_PATH),
                CodeSearch::unavailable(e.to_string()),
            )
        }
    };

    let settings = ClinicianSettings::from_values(
        std::env::var("OPTINOTE_CLINICIAN_NAME").ok(),
        std::env::var("OPTINOTE_DEPARTMENT").ok(),
        std::env::var("GROQ_API_KEY").ok(),
    );
    if settings.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY not set; /soap will reject requests");
    }
    let cfg = CoreConfig::new(catalogue_path, settings);
    tracing::info!(
        "Code catalogue: {} (search {})",
        cfg.code_catalogue_path().display(),
        if search.is_available() { "enabled" } else { "disabled" }
    );

    let soap = SoapFormatter::new(SoapConfig::from_overrides(
        std::env::var("OPTINOTE_SOAP_ENDPOINT").ok(),
        std::env::var("OPTINOTE_SOAP_MODEL").ok(),
    ))?;

    let state = AppState::new(cfg, ConditionCatalogue::builtin()?, search, soap);
    let app = router(state);

    tracing::info!("++ Starting OptiNote REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
