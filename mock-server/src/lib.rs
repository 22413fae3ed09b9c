use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub type Articles = Arc<RwLock<HashMap<String, Map<String, Value>>>>;

#[derive(Clone)]
pub struct MockState {
    token: Arc<str>,
    articles: Articles,
}

impl MockState {
    /// State accepting `token`, seeded with `sample_articles()`.
    pub fn new(token: &str) -> Self {
        Self::with_articles(token, sample_articles())
    }

    pub fn with_articles(token: &str, articles: HashMap<String, Map<String, Value>>) -> Self {
        Self {
            token: Arc::from(token),
            articles: Arc::new(RwLock::new(articles)),
        }
    }

    pub fn articles(&self) -> Articles {
        self.articles.clone()
    }
}

/// Articles served by a fresh mock, keyed by identifier.
pub fn sample_articles() -> HashMap<String, Map<String, Value>> {
    let fridge = json!({
        "F_1": "12441114",
        "F_3": "Test Description",
        "F_50001": "BE",
        "F_80004": "268.72",
        "F_80006": "25/12/2024",
        "F_80008": "259.90",
        "F_80010": "01/06/2024",
        "C_50000": "RECUPEL-20",
        "F_42": "300",
        "F_41": "425",
        "C_50010": "F",
        "F_47": "84182110",
        "F_54": "No"
    });
    let lamp = json!({
        "F_1": "12345678",
        "F_3": "Pendant lamp",
        "F_80004": 49.5,
        "F_42": "1.2",
        "F_54": "Yes"
    });

    [("12441114", fridge), ("12345678", lamp)]
        .into_iter()
        .filter_map(|(id, v)| match v {
            Value::Object(map) => Some((id.to_string(), map)),
            _ => None,
        })
        .collect()
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/api/v1/articles/{identifier}", get(get_article))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn envelope_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "status": "error", "message": message })))
}

async fn get_article(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(identifier): Path<String>,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", state.token);
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(expected.as_str()) {
        return envelope_error(StatusCode::UNAUTHORIZED, "Unauthenticated");
    }

    info!(%identifier, "article lookup");
    let articles = state.articles.read().await;
    match articles.get(&identifier) {
        Some(data) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "message": "Article found", "data": data })),
        ),
        // The upstream API reports unknown articles inside the envelope.
        None => envelope_error(StatusCode::OK, "Article not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_articles_include_reference_fridge() {
        let articles = sample_articles();
        let fridge = &articles["12441114"];
        assert_eq!(fridge["F_3"], "Test Description");
        assert_eq!(fridge["F_80004"], "268.72");
        assert_eq!(fridge["F_54"], "No");
        assert!(articles.contains_key("12345678"));
    }

    #[test]
    fn with_articles_replaces_seed() {
        let state = MockState::with_articles("t", HashMap::new());
        assert!(state.articles().try_read().unwrap().is_empty());
    }

    #[test]
    fn new_state_is_seeded() {
        let state = MockState::new("t");
        assert_eq!(state.articles().try_read().unwrap().len(), 2);
    }
}
