//! Endpoint URL validation and target URL construction

use crate::{Result, WebhookError};
use url::Url;

/// Path segment of the verification challenge
pub const VERIFICATION_SEGMENT: &str = "verification";

/// Path segment of notification deliveries
pub const NOTIFICATION_SEGMENT: &str = "notification";

/// Query parameter that carries the endpoint id in a verification challenge
pub const VERIFICATION_ID_PARAM: &str = "id";

/// Validate an endpoint URL: non-empty, absolute, http/https, with a host.
///
/// The scheme is checked before the host, and an http(s) URL must spell out
/// its authority with `//`.
pub fn validate(raw: &str) -> Result<Url> {
    if raw.is_empty() {
        return Err(WebhookError::EmptyUrl);
    }

    let url = Url::parse(raw).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => WebhookError::MissingScheme,
        url::ParseError::EmptyHost => match raw_scheme(raw) {
            Some(scheme) if !is_supported_scheme(&scheme) => {
                WebhookError::UnsupportedScheme(scheme)
            }
            _ => WebhookError::EmptyHost,
        },
        other => WebhookError::InvalidUrl(other),
    })?;

    if !is_supported_scheme(url.scheme()) {
        return Err(WebhookError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none_or(str::is_empty) || !has_authority(raw) {
        return Err(WebhookError::EmptyHost);
    }

    Ok(url)
}

fn is_supported_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// Lowercased text before the first `:`, as the URL parser would see it
fn raw_scheme(raw: &str) -> Option<String> {
    trim_leading(raw)
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
}

/// Whether the scheme is followed by `//` (`http:example.com` is not)
fn has_authority(raw: &str) -> bool {
    trim_leading(raw)
        .split_once(':')
        .is_some_and(|(_, rest)| rest.starts_with("//"))
}

fn trim_leading(raw: &str) -> &str {
    raw.trim_start_matches(|c: char| c <= ' ')
}

/// Build `<base>/verification?id=<id>`
pub fn verification_url(base: &str, id: &str) -> Result<Url> {
    let mut url = with_segment(base, VERIFICATION_SEGMENT)?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != VERIFICATION_ID_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(VERIFICATION_ID_PARAM, id);

    Ok(url)
}

/// Build `<base>/notification`
pub fn notification_url(base: &str) -> Result<Url> {
    with_segment(base, NOTIFICATION_SEGMENT)
}

fn with_segment(base: &str, segment: &str) -> Result<Url> {
    let mut url = validate(base)?;
    url.path_segments_mut()
        .map_err(|_| WebhookError::MissingScheme)?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}
