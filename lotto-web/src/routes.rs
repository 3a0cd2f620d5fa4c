use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use lotto_analysis::report::{build_report, AnalysisReport, ReportOptions};
use lotto_analysis::AnalysisError;
use lotto_db::db::{load_history, migrate, open_db};
use lotto_db::models::{Combination, DrawHistory};

pub struct AppState {
    pub db_path: PathBuf,
    pub options: ReportOptions,
    /// Date de référence fixe ; `None` : jour courant.
    pub reference: Option<NaiveDate>,
}

impl AppState {
    fn reference(&self) -> NaiveDate {
        self.reference
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Analysis(AnalysisError::InvalidDraw(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_draw")
            }
            ApiError::Analysis(AnalysisError::InsufficientData) => {
                (StatusCode::SERVICE_UNAVAILABLE, "insufficient_data")
            }
            ApiError::Analysis(AnalysisError::GenerationExhausted { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "generation_exhausted")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(kind, error = %format!("{self:#}"), "requête en échec");
        }
        let body = Json(json!({
            "success": false,
            "error": kind,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Charge l'historique puis applique `f`, le tout hors du runtime async.
async fn with_history<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(DrawHistory) -> Result<T, ApiError> + Send + 'static,
{
    let path = state.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let conn = open_db(&path)?;
        migrate(&conn)?;
        let history = load_history(&conn)?;
        f(history)
    })
    .await
    .context("Tâche interrompue")?
}

/// GET / : analyse complète et recommandations.
async fn report(State(state): State<Arc<AppState>>) -> Result<Json<AnalysisReport>, ApiError> {
    let reference = state.reference();
    let options = state.options;
    let report = with_history(&state, move |history| {
        let mut rng = StdRng::from_rng(&mut rand::rng());
        Ok(build_report(&history, reference, &options, &mut rng)?)
    })
    .await?;
    tracing::info!(draws = report.draw_count, "rapport généré");
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct CheckForm {
    #[serde(rename = "lottoNumber")]
    lotto_number: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    success: bool,
    won: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    draw_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
}

/// POST /check : la combinaison est-elle déjà sortie ?
async fn check(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CheckForm>,
) -> Result<Json<CheckResponse>, ApiError> {
    let combination: Combination = form
        .lotto_number
        .parse()
        .map_err(AnalysisError::InvalidDraw)?;

    let response = with_history(&state, move |history| {
        if history.is_empty() {
            return Err(AnalysisError::InsufficientData.into());
        }
        let response = match history.winning_draw(&combination) {
            Some(draw) => CheckResponse {
                success: true,
                won: true,
                message: format!(
                    "Félicitations ! Cette combinaison est sortie au tirage n°{}.",
                    draw.draw_no
                ),
                draw_no: Some(draw.draw_no),
                date: Some(draw.date),
            },
            None => CheckResponse {
                success: true,
                won: false,
                message: "Désolé, cette combinaison n'est jamais sortie.".to_string(),
                draw_no: None,
                date: None,
            },
        };
        Ok(response)
    })
    .await?;

    Ok(Json(response))
}

async fn health() -> &'static str {
    "OK"
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(report))
        .route("/check", post(check))
        .route("/health", get(health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lotto_db::db::insert_draw;
    use lotto_db::models::Draw;
    use tower::ServiceExt;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn app_with(draws: &[Draw]) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("lotto.db");
        let conn = open_db(&db_path).unwrap();
        migrate(&conn).unwrap();
        for draw in draws {
            insert_draw(&conn, draw).unwrap();
        }

        let state = Arc::new(AppState {
            db_path,
            options: ReportOptions::default(),
            reference: Some(date("2024-10-19")),
        });
        (dir, router(state))
    }

    fn sample_draws() -> Vec<Draw> {
        vec![
            Draw::new(1, date("2024-08-03"), &[1, 2, 3, 4, 5, 6], 7).unwrap(),
            Draw::new(2, date("2024-08-10"), &[10, 23, 29, 33, 37, 40], 16).unwrap(),
        ]
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn check_request(numbers: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/check")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(format!("lottoNumber={}", numbers.replace(',', "%2C"))))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app_with(&[]);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_report() {
        let (_dir, app) = app_with(&sample_draws());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["draw_count"], 2);
        assert_eq!(json["top_numbers"], json!([1, 2, 3, 4, 5]));
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_report_empty_db() {
        let (_dir, app) = app_with(&[]);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "insufficient_data");
    }

    #[tokio::test]
    async fn test_check_winning_combination() {
        let (_dir, app) = app_with(&sample_draws());
        let response = app.oneshot(check_request("40,37,33,29,23,10")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["won"], true);
        assert_eq!(json["draw_no"], 2);
        assert_eq!(json["date"], "2024-08-10");
    }

    #[tokio::test]
    async fn test_check_never_won() {
        let (_dir, app) = app_with(&sample_draws());
        let response = app.oneshot(check_request("1,2,3,4,5,7")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["won"], false);
        assert!(json.get("draw_no").is_none());
    }

    #[tokio::test]
    async fn test_check_empty_db() {
        let (_dir, app) = app_with(&[]);
        let response = app.oneshot(check_request("1,2,3,4,5,6")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "insufficient_data");
    }

    #[tokio::test]
    async fn test_check_invalid_input() {
        let (_dir, app) = app_with(&sample_draws());
        let response = app.oneshot(check_request("1,2,3,99,5,6")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "invalid_draw");
    }
}
