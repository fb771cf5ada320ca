//! Route-service client.
//!
//! The routing backend is an opaque HTTP service: it takes a start and end
//! coordinate and returns a walkable path plus optional snap corrections for
//! either endpoint. This module only models the wire contract; the surface
//! renders `path`/`start_snap`/`end_snap` from a successful response and
//! draws nothing on failure.

use crate::errors::RouteError;
use crate::geo::{LatLngBounds, Point, SnapCorrection};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_ALGORITHM: &str = "astar";

#[derive(Debug, Clone, Serialize)]
pub struct RouteRequest {
    pub start: Point,
    pub end: Point,
    pub algorithm: String,
}

/// A successful routing response.
///
/// `distance` is in meters, `duration` in seconds. `metrics` carries the
/// service's algorithm performance note (e.g. `"(123 nodes, 45ms)"`) and is
/// informational only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub distance: f64,
    pub duration: f64,
    pub algorithm: String,
    pub path: Vec<Point>,
    #[serde(default)]
    pub metrics: String,
    #[serde(default)]
    pub start_snap: Option<SnapCorrection>,
    #[serde(default)]
    pub end_snap: Option<SnapCorrection>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundsBody {
    min_lat: f64,
    min_lng: f64,
    max_lat: f64,
    max_lng: f64,
}

/// Anything that can compute a route. Implemented by [`RouteClient`] for the
/// real service; tests script their own.
pub trait RouteService: Send + Sync {
    fn route(
        &self,
        start: Point,
        end: Point,
        algorithm: &str,
    ) -> BoxFuture<'static, Result<RouteResponse, RouteError>>;
}

/// HTTP client for the navigation backend.
#[derive(Clone)]
pub struct RouteClient {
    http: reqwest::Client,
    base: Url,
}

impl RouteClient {
    pub fn new(base: &str) -> Result<Self, RouteError> {
        Ok(Self { http: reqwest::Client::new(), base: Url::parse(base)? })
    }

    /// Fetch the campus bounding box the service routes within. Useful to
    /// seed [`MapConfig::max_bounds`](crate::config::MapConfig).
    pub async fn bounds(&self) -> Result<LatLngBounds, RouteError> {
        let url = self.base.join("api/navigation/bounds")?;
        let body: BoundsBody = self.http.get(url).send().await?.error_for_status()?.json().await?;
        Ok(LatLngBounds::new(
            Point { lat: body.min_lat, lng: body.min_lng },
            Point { lat: body.max_lat, lng: body.max_lng },
        ))
    }

    async fn route_impl(
        &self,
        start: Point,
        end: Point,
        algorithm: String,
    ) -> Result<RouteResponse, RouteError> {
        let url = self.base.join("api/navigation/route")?;
        let request = RouteRequest { start, end, algorithm };

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

impl RouteService for RouteClient {
    fn route(
        &self,
        start: Point,
        end: Point,
        algorithm: &str,
    ) -> BoxFuture<'static, Result<RouteResponse, RouteError>> {
        let client = self.clone();
        let algorithm = algorithm.to_string();
        Box::pin(async move { client.route_impl(start, end, algorithm).await })
    }
}

/// Map a non-success response onto the domain error taxonomy. The service
/// reports domain failures as `{ "error": ..., "code"?: ... }`.
fn classify_failure(status: u16, body: &str) -> RouteError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (message, code) = match parsed {
        Some(b) => (b.error, b.code),
        None => (body.to_string(), None),
    };

    if code.as_deref() == Some("OUTSIDE_CAMPUS") {
        return RouteError::OutsideCampus;
    }
    match status {
        404 => RouteError::NoPathFound,
        400 => RouteError::MalformedRequest(message),
        _ => RouteError::Status { status, message },
    }
}
