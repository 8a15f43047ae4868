use uuid::Uuid;

use crate::domain::{
    events::ChunkJob,
    models::{BroadcastContent, Recipient},
};

/// Splits a resolved recipient set into chunk jobs of at most `chunk_size`
/// recipients, preserving input order. Every recipient lands in exactly one
/// chunk; empty input produces no jobs. The content snapshot is copied into
/// each job here so later campaign edits never reach in-flight work.
pub fn partition_recipients(
    campaign_id: Uuid,
    content: &BroadcastContent,
    recipients: &[Recipient],
    chunk_size: usize,
) -> Vec<ChunkJob> {
    let chunk_size = chunk_size.max(1);
    recipients
        .chunks(chunk_size)
        .map(|slice| ChunkJob {
            job_id: Uuid::new_v4(),
            campaign_id,
            recipient_ids: slice.iter().map(|r| r.id).collect(),
            content: content.clone(),
            attempt: 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Recipient;

    fn content() -> BroadcastContent {
        BroadcastContent {
            body: "hello".to_string(),
            parse_mode: None,
        }
    }

    fn recipients(count: usize) -> Vec<Recipient> {
        (0..count)
            .map(|i| Recipient::new(i as i64, None, None))
            .collect()
    }

    #[test]
    fn splits_into_ceil_k_over_n_chunks() {
        let set = recipients(250);
        let chunks = partition_recipients(Uuid::new_v4(), &content(), &set, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].recipient_ids.len(), 100);
        assert_eq!(chunks[1].recipient_ids.len(), 100);
        assert_eq!(chunks[2].recipient_ids.len(), 50);
    }

    #[test]
    fn preserves_order_without_overlap_or_omission() {
        let set = recipients(7);
        let chunks = partition_recipients(Uuid::new_v4(), &content(), &set, 3);
        let flattened: Vec<_> = chunks
            .iter()
            .flat_map(|c| c.recipient_ids.iter().copied())
            .collect();
        let expected: Vec<_> = set.iter().map(|r| r.id).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn empty_input_yields_no_jobs() {
        let chunks = partition_recipients(Uuid::new_v4(), &content(), &[], 100);
        assert!(chunks.is_empty());
    }

    #[test]
    fn exact_multiple_has_no_trailing_chunk() {
        let set = recipients(200);
        let chunks = partition_recipients(Uuid::new_v4(), &content(), &set, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.recipient_ids.len() == 100));
    }
}
