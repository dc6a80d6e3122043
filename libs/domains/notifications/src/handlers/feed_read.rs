use super::{FEED_READ_NOTIFICATION_ADDRESS, HandlerOutcome, NotificationHandlers};
use crate::envelope::{Personalisation, RequestingService};
use crate::error::DispatchResult;
use crate::events::{FeedReadExceptionEvent, FeedReadThresholdWarningEvent};
use crate::formatting::format_display_date;
use crate::templates::{EmailMessageType, feed_read_exception_template};
use crate::validation::{Validate, require_timestamp};
use tracing::instrument;

impl NotificationHandlers {
    /// Alert the operations mailbox about an unreadable feed entry.
    #[instrument(skip(self, event), fields(exception_type = %event.exception_type, bookmark = %event.bookmark))]
    pub async fn handle_feed_read_exception(
        &self,
        event: &FeedReadExceptionEvent,
    ) -> DispatchResult<HandlerOutcome> {
        event.validate()?;
        let template = feed_read_exception_template(&event.exception_type)?;
        let recipient = self.settings.required(FEED_READ_NOTIFICATION_ADDRESS)?;

        let personalisation = Personalisation::new()
            .with("exceptionType", event.exception_type.as_str())
            .with("bookmark", event.bookmark.to_string())
            .with("url", event.url.as_str());

        self.publish([recipient], RequestingService::FeedRead, template, personalisation)
            .await
    }

    #[instrument(skip(self, event), fields(bookmark_id = %event.bookmark_id))]
    pub async fn handle_feed_read_threshold_warning(
        &self,
        event: &FeedReadThresholdWarningEvent,
    ) -> DispatchResult<HandlerOutcome> {
        event.validate()?;
        let start = require_timestamp("start", &event.start)?;
        let now = require_timestamp("now", &event.now)?;
        let recipient = self.settings.required(FEED_READ_NOTIFICATION_ADDRESS)?;

        let personalisation = Personalisation::new()
            .with("start", format_display_date(start))
            .with("now", format_display_date(now))
            .with("bookmarkId", event.bookmark_id.to_string())
            .with("lastPageUrl", event.last_page_url.as_str());

        self.publish(
            [recipient],
            RequestingService::FeedRead,
            EmailMessageType::FeedReadThresholdWarning,
            personalisation,
        )
        .await
    }
}
