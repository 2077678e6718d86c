use axum::http::Method;
use chrono::Utc;

use super::{ViewEvent, ViewSubscriber};

/// Stamps newly created entities with the current time
pub struct PublishedDateEntitySubscriber;

impl ViewSubscriber for PublishedDateEntitySubscriber {
    fn name(&self) -> &'static str {
        "published_date_entity"
    }

    fn on_view(&self, event: &mut ViewEvent<'_>) {
        if event.method != Method::POST {
            return;
        }

        if let Some(entity) = event.result.dated() {
            entity.set_published(Utc::now());
        }
    }
}
