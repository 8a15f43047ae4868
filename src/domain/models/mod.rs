pub mod campaign;
pub mod recipient;

pub use campaign::{BroadcastContent, Campaign, CampaignStatus, ParseMode};
pub use recipient::{DeliveryOutcome, DeliveryRecord, DeliveryTally, Recipient};
