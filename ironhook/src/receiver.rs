//! Helpers for the receiving side of a webhook endpoint

use crate::url_policy::VERIFICATION_ID_PARAM;
use crate::{Result, WebhookNotification};
use url::Url;

/// Answer to a verification challenge: the value of the `id` query
/// parameter, which the receiver must write back verbatim as the response
/// body. Returns `None` when the parameter is missing or empty.
pub fn answer_challenge(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == VERIFICATION_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Decode a notification request body
pub fn parse_notification(body: &[u8]) -> Result<WebhookNotification> {
    Ok(serde_json::from_slice(body)?)
}
