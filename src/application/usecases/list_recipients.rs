use std::sync::Arc;

use crate::domain::{models::Recipient, repositories::RecipientDirectory};

pub struct ListRecipientsUseCase {
    directory: Arc<dyn RecipientDirectory>,
}

impl ListRecipientsUseCase {
    pub fn new(directory: Arc<dyn RecipientDirectory>) -> Self {
        Self { directory }
    }

    pub async fn execute(&self) -> anyhow::Result<Vec<Recipient>> {
        self.directory.list_eligible().await
    }
}
