// Axum API Server Module
//
// Purpose: JSON endpoints for pest diagnosis, guidance translation and the
// treatment effectiveness log. Diagnosis and translation never return an
// error status; every failure degrades to a generic, non-empty payload.

#[cfg(feature = "api")]
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use serde::Serialize;

#[cfg(feature = "api")]
use crate::config::AppConfig;

#[cfg(feature = "api")]
use crate::effectiveness::{
    aggregate, comparison_rows, EffectivenessLogEntry, LogPatch, LogStore, NewLogEntry, StoreError,
};

#[cfg(feature = "api")]
use crate::guidance::GuidanceComposer;

#[cfg(feature = "api")]
use crate::knowledge::{fallback_steps, KnowledgeBase, RemedyStep, UNKNOWN_PEST};

#[cfg(feature = "api")]
use crate::recommendation::{steps_for_result, RemedyGroups};

#[cfg(feature = "api")]
use crate::scorer::{DiagnosisQuery, DiagnosisScorer};

#[cfg(feature = "api")]
use crate::translation::{generate_or, translate, TextGenerator, TranslationRequest};

/// Matches returned alongside the top diagnosis
#[cfg(feature = "api")]
const TOP_MATCHES: usize = 3;

#[cfg(feature = "api")]
const FALLBACK_NOTES: &str =
    "Fallback: try neem extract, field sanitation, and conserve predators; recheck symptoms.";

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<DiagnosisScorer>,
    pub text_generator: Arc<dyn TextGenerator>,
    pub log_store: Arc<dyn LogStore>,
    /// Ask the provider to phrase diagnosis notes
    pub ai_notes: bool,
}

#[cfg(feature = "api")]
impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading knowledge base...");
        let kb = config.load_knowledge_base()?;
        tracing::info!(
            "Knowledge base ready: {:?}, crops {:?}, {} pests",
            kb.variant,
            kb.crop_keys(),
            kb.pest_count()
        );

        let text_generator = config.text_generator();
        tracing::info!("Text generator: {}", text_generator.name());

        Ok(Self::from_parts(kb, text_generator, config.log_store(), config.ai_notes))
    }

    /// Assemble from explicit collaborators (tests inject fakes here)
    pub fn from_parts(
        kb: KnowledgeBase,
        text_generator: Arc<dyn TextGenerator>,
        log_store: Arc<dyn LogStore>,
        ai_notes: bool,
    ) -> Self {
        Self {
            scorer: Arc::new(DiagnosisScorer::new(Arc::new(kb))),
            text_generator,
            log_store,
            ai_notes,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Knowledge base overview (crop picker)
        .route("/api/knowledge/crops", get(list_crops))

        // Diagnosis + guidance
        .route("/api/diagnose", post(diagnose))
        .route("/api/translate", post(translate_guidance))

        // Effectiveness log
        .route("/api/logs", get(list_logs).post(create_log))
        .route("/api/logs/summary", get(logs_summary))
        .route("/api/logs/:id", patch(update_log).delete(delete_log))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive()) // The UI is served from another origin
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(feature = "api")]
async fn list_crops(State(state): State<AppState>) -> Json<serde_json::Value> {
    let kb = state.scorer.knowledge_base();
    let crops: Vec<serde_json::Value> = kb
        .sections
        .iter()
        .map(|section| {
            serde_json::json!({
                "key": section.key,
                "aliases": section.aliases,
                "pests": section.pests.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "variant": kb.variant,
        "crops": crops,
    }))
}

#[cfg(feature = "api")]
async fn diagnose(State(state): State<AppState>, body: Bytes) -> Json<DiagnosisPayload> {
    let body = parse_body_lenient(&body);
    let query = DiagnosisQuery::from_json_value(&body);

    // Photos are accepted for the record but do not influence scoring
    if body.get("photo").and_then(|v| v.as_str()).is_some_and(|p| !p.is_empty()) {
        tracing::debug!("Diagnose request carried a photo (ignored by scorer)");
    }

    match build_diagnosis(&state, query).await {
        Ok(payload) => {
            tracing::info!(
                "Diagnosed '{}' at {} for crop '{}'",
                payload.diagnosis.pest,
                payload.diagnosis.confidence,
                payload.context.as_ref().map(|c| c.crop.as_str()).unwrap_or("")
            );
            Json(payload)
        }
        Err(e) => {
            tracing::error!("Diagnosis failed, returning fallback: {:#}", e);
            Json(DiagnosisPayload::fallback())
        }
    }
}

#[cfg(feature = "api")]
async fn build_diagnosis(state: &AppState, query: DiagnosisQuery) -> anyhow::Result<DiagnosisPayload> {
    let ranked = state.scorer.rank(&query);
    let top = ranked
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("scorer returned no results"))?;

    let steps = steps_for_result(&top, state.scorer.knowledge_base());
    anyhow::ensure!(!steps.is_empty(), "no remedy steps for '{}'", top.pest_name);
    let groups = RemedyGroups::from_steps(&steps);

    let default_notes = GuidanceComposer::compose_notes(&top, &groups);
    let ai_notes = if state.ai_notes && !top.is_unknown() {
        let prompt = GuidanceComposer::notes_prompt(&query, &top, &groups);
        generate_or(state.text_generator.as_ref(), &prompt, &default_notes).await
    } else {
        default_notes
    };

    let guidance = GuidanceComposer::compose(&query, &steps, Some(&ai_notes));

    let top_matches = ranked
        .iter()
        .filter(|r| !r.is_unknown())
        .take(TOP_MATCHES)
        .map(|r| TopMatch {
            pest: r.pest_name.clone(),
            score: r.confidence,
            crop: r.crop_key.clone().unwrap_or_default(),
        })
        .collect();

    Ok(DiagnosisPayload {
        diagnosis: DiagnosisSummary {
            pest: top.pest_name.clone(),
            confidence: top.confidence,
            reasons: top.matched_reasons.clone(),
        },
        recommendations: groups,
        ml_prediction: None,
        ai_notes,
        context: Some(query),
        top_matches,
        steps,
        guidance,
    })
}

#[cfg(feature = "api")]
async fn translate_guidance(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<crate::translation::TranslationResponse> {
    let request = TranslationRequest::from_json_value(&parse_body_lenient(&body));
    Json(translate(state.text_generator.as_ref(), &request).await)
}

#[cfg(feature = "api")]
async fn list_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<EffectivenessLogEntry>>, AppError> {
    Ok(Json(state.log_store.get_all()?))
}

#[cfg(feature = "api")]
async fn create_log(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<EffectivenessLogEntry>), AppError> {
    let new_entry: NewLogEntry = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid log entry: {}", e)))?;
    let entry = new_entry.into_entry();
    entry.validate().map_err(AppError::BadRequest)?;

    state.log_store.save(entry.clone())?;
    tracing::info!("Stored log {} ({} / {:?})", entry.id, entry.pest, entry.method_type);
    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(feature = "api")]
async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<EffectivenessLogEntry>, AppError> {
    let changes: LogPatch = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid log patch: {}", e)))?;

    // The store validates the patched entry under its own lock
    let updated = state
        .log_store
        .update(&id, &changes)?
        .ok_or_else(|| AppError::NotFound(format!("Log {} not found", id)))?;
    Ok(Json(updated))
}

#[cfg(feature = "api")]
async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.log_store.remove(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Log {} not found", id)))
    }
}

#[cfg(feature = "api")]
async fn logs_summary(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let logs = state.log_store.get_all()?;
    let summary = aggregate(&logs);
    let rows = comparison_rows(&summary);

    Ok(Json(serde_json::json!({
        "entries": logs.len(),
        "summary": summary,
        "rows": rows,
    })))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisSummary {
    pub pest: String,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

#[cfg(feature = "api")]
#[derive(Debug, Clone, Serialize)]
pub struct TopMatch {
    pub pest: String,
    pub score: f64,
    pub crop: String,
}

#[cfg(feature = "api")]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisPayload {
    pub diagnosis: DiagnosisSummary,
    pub recommendations: RemedyGroups,
    /// No model inference; always null
    pub ml_prediction: Option<serde_json::Value>,
    pub ai_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<DiagnosisQuery>,
    pub top_matches: Vec<TopMatch>,
    pub steps: Vec<RemedyStep>,
    /// Text for display, read-aloud and translation
    pub guidance: String,
}

#[cfg(feature = "api")]
impl DiagnosisPayload {
    /// Fixed payload used when the pipeline itself fails
    pub fn fallback() -> Self {
        let steps = fallback_steps();
        Self {
            diagnosis: DiagnosisSummary {
                pest: UNKNOWN_PEST.to_string(),
                confidence: 0.1,
                reasons: Vec::new(),
            },
            recommendations: RemedyGroups::from_steps(&steps),
            ml_prediction: None,
            ai_notes: FALLBACK_NOTES.to_string(),
            context: None,
            top_matches: Vec::new(),
            guidance: GuidanceComposer::compose(&DiagnosisQuery::default(), &steps, Some(FALLBACK_NOTES)),
            steps,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Body as JSON; malformed or empty bodies become `{}`
#[cfg(feature = "api")]
fn parse_body_lenient(body: &[u8]) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::json!({});
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) if value.is_object() => value,
        Ok(_) => serde_json::json!({}),
        Err(e) => {
            tracing::debug!("Malformed request body, using empty defaults: {}", e);
            serde_json::json!({})
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Store(StoreError),
}

#[cfg(feature = "api")]
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invalid(msg) => AppError::BadRequest(msg),
            other => AppError::Store(other),
        }
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Store(e) => {
                tracing::error!("Log store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(all(test, feature = "api"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_lenient() {
        assert_eq!(parse_body_lenient(b""), serde_json::json!({}));
        assert_eq!(parse_body_lenient(b"{not json"), serde_json::json!({}));
        assert_eq!(parse_body_lenient(b"[1,2]"), serde_json::json!({}));
        assert_eq!(parse_body_lenient(br#"{"crop":"Rice"}"#)["crop"], "Rice");
    }

    #[test]
    fn test_fallback_payload_shape() {
        let json = serde_json::to_value(DiagnosisPayload::fallback()).unwrap();
        assert_eq!(json["diagnosis"]["pest"], "Unknown");
        assert_eq!(json["diagnosis"]["confidence"], 0.1);
        assert!(json["mlPrediction"].is_null());
        assert!(json.get("context").is_none());
        assert_eq!(json["recommendations"]["bio"][0], "Apply neem-based extract 3–5%");
        assert!(json["guidance"].as_str().unwrap().contains("1. Apply neem-based extract"));
    }
}
