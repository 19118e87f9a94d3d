//! Test utilities for integration tests
use huddle::backend::BackendClient;
use huddle::core::SessionContext;

/// A mock backend plus a client pointed at it and a signed-in session.
/// Register mocks on `server` before exercising the client.
pub struct TestBackend {
    pub server: mockito::ServerGuard,
    pub client: BackendClient,
    pub session: SessionContext,
}

pub async fn test_backend() -> TestBackend {
    let server = mockito::Server::new_async().await;
    let client = BackendClient::new(&server.url());
    let session = SessionContext::signed_in("42", Some("test-token"));
    TestBackend {
        server,
        client,
        session,
    }
}
