use axum::http::Method;
use tracing::{debug, warn};

use super::{Author, ViewEvent, ViewSubscriber};

/// Sets the author of newly created entities to the requesting principal
pub struct AuthoredEntitySubscriber;

impl ViewSubscriber for AuthoredEntitySubscriber {
    fn name(&self) -> &'static str {
        "authored_entity"
    }

    fn on_view(&self, event: &mut ViewEvent<'_>) {
        if event.method != Method::POST {
            return;
        }

        let principal = event.principal;
        let kind = event.result.kind();
        let Some(entity) = event.result.authored() else {
            return;
        };

        match principal {
            Some(principal) => {
                debug!("Setting author of new {} to user_id={}", kind, principal.user_id);
                entity.set_author(Author::from(principal));
            }
            None => warn!("Created {} without an authenticated principal; author left unset", kind),
        }
    }
}
