use forumauth::app::AppState;
use forumauth::auth::rate_limit::RequestGate;
use forumauth::auth::seed::seed_permissions;
use forumauth::auth::token::TokenCodec;
use forumauth::store::memory::InMemoryStore;
use std::sync::Arc;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

/// Gate that admits everything, so tests exercise the auth chain without
/// budgeting requests.
pub struct AllowAllGate;

impl RequestGate for AllowAllGate {
    fn allow(&self, _ip: &str) -> bool {
        true
    }
}

pub const TEST_SECRET: &str = "integration-secret";

/// Seeded in-memory state with an allow-all gate.
pub async fn seeded_state(allow_admin: bool) -> AppState {
    let store = InMemoryStore::new();
    seed_permissions(&store).await.expect("seed");
    AppState {
        store: Arc::new(store),
        tokens: TokenCodec::new(TEST_SECRET),
        gate: Arc::new(AllowAllGate),
        allow_admin,
        trust_proxy: false,
    }
}
