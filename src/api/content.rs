//! Forum content route bindings.
//!
//! # Purpose
//! The content service owns questions, answers, votes, and the rest of the
//! forum domain; this crate owns admission, identity, and authorization for
//! those routes. Each binding below declares the HTTP surface plus the
//! `(resource, action)` pair its middleware chain enforces. The shared
//! handler acknowledges the request once the chain has passed; the real
//! content logic attaches behind it at integration time.
//!
//! # Key invariants
//! - Every binding's pair exists in the default matrix (`guard` asserts it
//!   at startup).
//! - Bindings never overlap: one method and path appears at most once.
use crate::api::types::AckResponse;
use axum::Json;

/// One protected content route: method, path, and the permission pair its
/// chain checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBinding {
    pub method: &'static str,
    pub path: &'static str,
    pub resource: &'static str,
    pub action: &'static str,
}

const fn bind(
    method: &'static str,
    path: &'static str,
    resource: &'static str,
    action: &'static str,
) -> ContentBinding {
    ContentBinding {
        method,
        path,
        resource,
        action,
    }
}

/// Protected forum surface. Kept sorted by resource.
pub const CONTENT_BINDINGS: &[ContentBinding] = &[
    bind("POST", "/api/questions", "question", "create"),
    bind("GET", "/api/questions", "question", "view"),
    bind("PUT", "/api/questions/:id", "question", "edit"),
    bind("DELETE", "/api/questions/:id", "question", "delete"),
    bind("POST", "/api/questions/:id/approve", "question", "approve"),
    bind("POST", "/api/questions/:id/status", "question", "change_status"),
    bind("POST", "/api/answers", "answer", "create"),
    bind("GET", "/api/answers", "answer", "view"),
    bind("PUT", "/api/answers/:id", "answer", "edit"),
    bind("DELETE", "/api/answers/:id", "answer", "delete"),
    bind("POST", "/api/answers/:id/accept", "answer", "accept"),
    bind("POST", "/api/comments", "comment", "create"),
    bind("GET", "/api/comments", "comment", "view"),
    bind("PUT", "/api/comments/:id", "comment", "edit"),
    bind("DELETE", "/api/comments/:id", "comment", "delete"),
    bind("POST", "/api/votes", "vote", "create"),
    bind("DELETE", "/api/votes/:id", "vote", "delete"),
    bind("POST", "/api/tags", "tag", "create"),
    bind("GET", "/api/tags", "tag", "view"),
    bind("PUT", "/api/tags/:id", "tag", "edit"),
    bind("DELETE", "/api/tags/:id", "tag", "delete"),
    bind("POST", "/api/follows", "follow", "create"),
    bind("DELETE", "/api/follows/:id", "follow", "delete"),
    bind("POST", "/api/groups", "group", "create"),
    bind("GET", "/api/groups", "group", "view"),
    bind("POST", "/api/groups/:id/join", "group", "join"),
    bind("POST", "/api/groups/:id/leave", "group", "leave"),
    bind("POST", "/api/posts", "post", "create"),
    bind("GET", "/api/posts", "post", "view"),
    bind("PUT", "/api/posts/:id", "post", "edit"),
    bind("POST", "/api/posts/:id/status", "post", "edit_status"),
    bind("POST", "/api/reports", "report", "create"),
    bind("GET", "/api/reports", "report", "view"),
    bind("POST", "/api/reports/:id/approve", "report", "approve"),
    bind("POST", "/api/reports/:id/reject", "report", "reject"),
    bind("GET", "/api/notifications", "notification", "view"),
    bind("DELETE", "/api/notifications/:id", "notification", "delete"),
    bind("POST", "/api/attachments", "attachment", "create"),
    bind("DELETE", "/api/attachments/:id", "attachment", "delete"),
    bind("POST", "/api/messages", "message", "create"),
    bind("GET", "/api/messages", "message", "view"),
    bind("POST", "/api/topics", "topic", "create"),
    bind("GET", "/api/topics", "topic", "view"),
    bind("POST", "/api/topics/:id/follow", "topic", "follow"),
    bind("POST", "/api/reactions", "reaction", "create"),
    bind("DELETE", "/api/reactions/:id", "reaction", "delete"),
    bind("GET", "/api/activities", "activity", "view"),
    bind("GET", "/api/analytics", "analytic", "view"),
    bind("POST", "/api/files", "file", "create"),
    bind("GET", "/api/files", "file", "view"),
    bind("DELETE", "/api/files/:id", "file", "delete"),
];

/// Shared terminal handler for content bindings. Reaching it means the full
/// chain passed; the body is a plain acknowledgement.
pub(crate) async fn accepted() -> Json<AckResponse> {
    Json(AckResponse::accepted())
}
