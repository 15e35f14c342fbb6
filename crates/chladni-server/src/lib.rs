use std::str::FromStr;
use std::time::Instant;

use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use chladni_field::{BoundaryKind, BoundingBox, ChladniField, FieldError, WaveParameters};
use chladni_mesh::export::to_binary_stl;
use chladni_mesh::{Mesh, extract_from_field};

const DEFAULT_RESOLUTION: usize = 100;
const MAX_TRIANGLES: usize = 10_000_000;
const ISO_LEVEL: f64 = 0.0;

pub fn app() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pattern", get(pattern))
        .route("/api/pattern/stl", get(pattern_stl))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

/// Query parameters of the pattern endpoints. Every parameter is optional;
/// defaults reproduce the fundamental Dirichlet mode over the unit cube.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct PatternQuery {
    u: f64,
    v: f64,
    w: f64,
    #[serde(rename = "A")]
    a: f64,
    #[serde(rename = "B")]
    b: f64,
    #[serde(rename = "C")]
    c: f64,
    #[serde(rename = "D")]
    d: f64,
    #[serde(rename = "E")]
    e: f64,
    #[serde(rename = "F")]
    f: f64,
    min_x: f64,
    min_y: f64,
    min_z: f64,
    max_x: f64,
    max_y: f64,
    max_z: f64,
    resolution: usize,
    boundary: String,
}

impl Default for PatternQuery {
    fn default() -> Self {
        Self {
            u: 1.0,
            v: 1.0,
            w: 1.0,
            a: 1.0,
            b: 1.0,
            c: 1.0,
            d: 1.0,
            e: 1.0,
            f: 1.0,
            min_x: -1.0,
            min_y: -1.0,
            min_z: -1.0,
            max_x: 1.0,
            max_y: 1.0,
            max_z: 1.0,
            resolution: DEFAULT_RESOLUTION,
            boundary: "dirichlet".to_string(),
        }
    }
}

/// Fully validated extraction request.
#[derive(Debug, Clone, Copy)]
struct PatternRequest {
    field: ChladniField,
    bounds: BoundingBox,
    resolution: usize,
}

impl PatternQuery {
    fn validate(&self) -> Result<PatternRequest, ApiError> {
        let boundary = BoundaryKind::from_str(&self.boundary).map_err(ApiError::from)?;
        let bounds = BoundingBox::new(
            [self.min_x, self.min_y, self.min_z],
            [self.max_x, self.max_y, self.max_z],
        )
        .map_err(ApiError::from)?;
        enforce_triangle_limit(self.resolution)?;

        let params = WaveParameters {
            u: self.u,
            v: self.v,
            w: self.w,
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            f: self.f,
        };

        Ok(PatternRequest {
            field: ChladniField::new(params, boundary),
            bounds,
            resolution: self.resolution,
        })
    }
}

/// Boundary serialization of a mesh: exactly `vertices` and `faces`.
#[derive(Debug, Serialize, Deserialize)]
struct PatternResponse {
    vertices: Vec<[f64; 3]>,
    faces: Vec<[u32; 3]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn payload_too_large(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: message.into(),
        }
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::InvalidBoundaryKind { .. }
            | FieldError::InvalidBoundingBox { .. }
            | FieldError::InvalidResolution { .. } => Self::bad_request(err.to_string()),
            FieldError::NonFiniteSample { .. } => Self::unprocessable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn pattern(Query(query): Query<PatternQuery>) -> Result<Json<PatternResponse>, ApiError> {
    let request = query.validate()?;
    let (mesh, time_ms) = generate_pattern(&request)?;
    info!(
        resolution = request.resolution,
        vertices = mesh.vertices.len(),
        triangles = mesh.triangles.len(),
        time_ms,
        "pattern generated"
    );
    Ok(Json(PatternResponse {
        vertices: mesh.vertices,
        faces: mesh.triangles,
    }))
}

async fn pattern_stl(Query(query): Query<PatternQuery>) -> Result<Response, ApiError> {
    let request = query.validate()?;
    let (mesh, time_ms) = generate_pattern(&request)?;
    debug!(triangles = mesh.triangles.len(), time_ms, "stl export");
    let bytes = to_binary_stl(&mesh, "chladni");

    let mut response = Response::new(axum::body::Body::from(bytes));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    response.headers_mut().insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"chladni.stl\""),
    );
    Ok(response)
}

/// Caps worst-case output size: a cell yields at most 5 triangles.
fn enforce_triangle_limit(resolution: usize) -> Result<(), ApiError> {
    let cells_per_axis = resolution.saturating_sub(1);
    let max_triangles = 5usize
        .saturating_mul(cells_per_axis)
        .saturating_mul(cells_per_axis)
        .saturating_mul(cells_per_axis);

    if max_triangles > MAX_TRIANGLES {
        return Err(ApiError::payload_too_large(
            "requested resolution exceeds the 10M triangle safety limit",
        ));
    }

    Ok(())
}

fn generate_pattern(request: &PatternRequest) -> Result<(Mesh, f64), ApiError> {
    let start = Instant::now();
    let mesh = extract_from_field(request.bounds, request.resolution, &request.field, ISO_LEVEL)
        .map_err(ApiError::from)?;
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok((mesh, time_ms))
}
