//! Challenge-response verification of endpoint ownership
//!
//! The verifier sends `GET <url>/verification?id=<endpoint id>` and expects
//! the response body to be exactly the endpoint id. Only then will
//! notifications be delivered to the endpoint.

use crate::store::{load_endpoint, save_endpoint};
use crate::url_policy;
use crate::{
    HttpTransport, RecordStore, Result, StatusEvent, TransportError, TransportRequest,
    WebhookEndpoint, WebhookError,
};
use http::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Runs verification challenges against registered endpoints
#[derive(Clone)]
pub struct EndpointVerifier {
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl EndpointVerifier {
    /// Create a verifier that waits at most `timeout` for each challenge
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            timeout,
        }
    }

    /// Verify the endpoint with the given id and persist the promotion.
    ///
    /// Already activated endpoints are returned as-is without a request.
    pub async fn verify(&self, id: Uuid) -> Result<WebhookEndpoint> {
        let mut endpoint = load_endpoint(self.store.as_ref(), id).await?;

        if endpoint.is_activated() {
            debug!(endpoint_id = %id, status = %endpoint.status, "Endpoint already verified");
            return Ok(endpoint);
        }

        let challenge = endpoint.id.to_string();
        let url = url_policy::verification_url(&endpoint.url, &challenge)?;

        debug!(endpoint_id = %id, url = %url, "Sending verification challenge");
        let response = self
            .transport
            .send(TransportRequest::new(Method::GET, url), self.timeout)
            .await
            .map_err(|e| {
                warn!(endpoint_id = %id, error = %e, "Verification request failed");
                WebhookError::VerificationFailed(e.to_string())
            })?;

        if let Err(reason) = check_challenge(response.bytes(), &challenge) {
            warn!(endpoint_id = %id, reason = %reason, "Failed endpoint verification");
            return Err(WebhookError::VerificationFailed(reason));
        }

        endpoint.apply(StatusEvent::VerificationSucceeded);
        save_endpoint(self.store.as_ref(), &endpoint).await?;

        info!(endpoint_id = %id, "Endpoint verified");
        Ok(endpoint)
    }
}

/// Compare a challenge response body with the expected id, byte for byte
fn check_challenge(
    body: std::result::Result<&[u8], TransportError>,
    expected: &str,
) -> std::result::Result<(), String> {
    match body {
        Err(e) => Err(e.to_string()),
        Ok(bytes) if bytes == expected.as_bytes() => Ok(()),
        Ok(_) => Err("response body does not match the challenge id".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::{EndpointStatus, MemoryStore, TransportResponse};

    async fn seeded(status: EndpointStatus) -> (Arc<MemoryStore>, WebhookEndpoint) {
        let store = Arc::new(MemoryStore::new());
        let mut endpoint = WebhookEndpoint::new("http://example.com/hooks").with_id(Uuid::new_v4());
        endpoint.status = status;
        store.insert_endpoint(&endpoint).await.unwrap();
        (store, endpoint)
    }

    fn verifier(store: Arc<MemoryStore>, transport: &ScriptedTransport) -> EndpointVerifier {
        EndpointVerifier::new(store, Arc::new(transport.clone()), Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_verify_promotes_and_persists() {
        let (store, endpoint) = seeded(EndpointStatus::Unverified).await;
        let transport = ScriptedTransport::echo_id();

        let verified = verifier(store.clone(), &transport)
            .verify(endpoint.id)
            .await
            .unwrap();

        assert_eq!(verified.status, EndpointStatus::Verified);
        let stored = store.find_endpoint(endpoint.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EndpointStatus::Verified);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (request, timeout) = &calls[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(
            request.url.as_str(),
            format!("http://example.com/hooks/verification?id={}", endpoint.id)
        );
        assert_eq!(*timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_verify_short_circuits_when_activated() {
        for status in [EndpointStatus::Verified, EndpointStatus::Healthy] {
            let (store, endpoint) = seeded(status).await;
            let transport = ScriptedTransport::echo_id();

            let result = verifier(store, &transport).verify(endpoint.id).await.unwrap();

            assert_eq!(result.status, status);
            assert_eq!(transport.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_verify_suspended_sends_challenge() {
        let (store, endpoint) = seeded(EndpointStatus::Suspended).await;
        let transport = ScriptedTransport::echo_id();

        let result = verifier(store, &transport).verify(endpoint.id).await.unwrap();

        assert_eq!(result.status, EndpointStatus::Verified);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_verify_wrong_body() {
        let (store, endpoint) = seeded(EndpointStatus::Unverified).await;
        let transport = ScriptedTransport::always(200, "Url Param 'id' is missing");

        let err = verifier(store.clone(), &transport)
            .verify(endpoint.id)
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::VerificationFailed(_)));
        let stored = store.find_endpoint(endpoint.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EndpointStatus::Unverified);
    }

    #[tokio::test]
    async fn test_verify_body_is_not_trimmed() {
        let (store, endpoint) = seeded(EndpointStatus::Unverified).await;
        let transport = ScriptedTransport::new(|request| {
            let id = crate::answer_challenge(&request.url).unwrap_or_default();
            Ok(TransportResponse::new(200, format!("{id}\n")))
        });

        let err = verifier(store, &transport)
            .verify(endpoint.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::VerificationFailed(_)));
    }

    #[tokio::test]
    async fn test_verify_unreadable_body() {
        let (store, endpoint) = seeded(EndpointStatus::Unverified).await;
        let transport =
            ScriptedTransport::new(|_| Ok(TransportResponse::unreadable(200, "reset by peer")));

        let err = verifier(store, &transport)
            .verify(endpoint.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::VerificationFailed(_)));
    }

    #[tokio::test]
    async fn test_verify_transport_error() {
        let (store, endpoint) = seeded(EndpointStatus::Unverified).await;
        let transport = ScriptedTransport::unreachable();

        let err = verifier(store, &transport)
            .verify(endpoint.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::VerificationFailed(_)));
    }

    #[tokio::test]
    async fn test_verify_missing_and_unknown_id() {
        let store = Arc::new(MemoryStore::new());
        let transport = ScriptedTransport::echo_id();
        let verifier = verifier(store, &transport);

        assert!(matches!(
            verifier.verify(Uuid::nil()).await,
            Err(WebhookError::MissingId)
        ));
        assert!(matches!(
            verifier.verify(Uuid::new_v4()).await,
            Err(WebhookError::NotFound(_))
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_check_challenge() {
        assert!(check_challenge(Ok(&b"abcd"[..]), "abcd").is_ok());
        assert!(check_challenge(Ok(&b"ABCD"[..]), "abcd").is_err());
        assert!(check_challenge(Ok(&b""[..]), "abcd").is_err());
        assert!(check_challenge(Err(TransportError::Body("eof".into())), "abcd").is_err());
    }
}
