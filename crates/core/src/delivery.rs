//! Batching rules for delivering generated photos over the messaging
//! transport.
//!
//! Telegram caps a media group at 10 items; anything larger must be
//! split. A batch of exactly one item is sent as a plain photo message
//! instead of a one-element group.

/// Maximum number of items in a single media group.
pub const MEDIA_GROUP_LIMIT: usize = 10;

/// A single delivery call to the messaging transport.
#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryBatch<'a> {
    /// One photo, sent via `sendPhoto`.
    Single(&'a str),
    /// Two or more photos, sent via `sendMediaGroup`.
    Group(Vec<&'a str>),
}

/// Split an ordered list of photo URLs into transport-sized batches.
///
/// Ordering is preserved: batch N contains URLs strictly before those
/// in batch N+1.
pub fn plan_batches(urls: &[String]) -> Vec<DeliveryBatch<'_>> {
    urls.chunks(MEDIA_GROUP_LIMIT)
        .map(|chunk| {
            if chunk.len() == 1 {
                DeliveryBatch::Single(chunk[0].as_str())
            } else {
                DeliveryBatch::Group(chunk.iter().map(|u| u.as_str()).collect())
            }
        })
        .collect()
}

/// Caption attached to the first delivered batch.
pub fn delivery_caption(photo_count: usize) -> String {
    if photo_count == 1 {
        "Your photo is ready!".to_string()
    } else {
        format!("Your {photo_count} photos are ready!")
    }
}
