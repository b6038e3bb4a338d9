//! Inbound notification pipeline.
//!
//! One stored email flows through:
//! 1. `TriggerPayload::first_object()` - locate the object
//! 2. `ObjectFetcher::fetch()` - raw bytes from storage
//! 3. `InboundMessage::parse()` - headers + primary body part
//! 4. `Classifier::classify()` - normalized body to the endpoint
//! 5. `reply::compose()` - categorization reply
//! 6. `Notifier::send()` - dispatch, subject to `DispatchFailurePolicy`

pub mod handler;

pub use handler::{NotificationHandler, Outcome};
