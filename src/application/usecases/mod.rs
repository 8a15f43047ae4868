pub mod campaign_progress;
pub mod create_campaign;
pub mod dispatch_draft;
pub mod dispatch_scheduled;
pub mod list_recipients;
pub mod notify_recipient;
pub mod register_recipient;
