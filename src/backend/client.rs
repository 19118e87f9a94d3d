//! HTTP client for the hangout backend.
//!
//! One method per endpoint. Every non-2xx response becomes a typed error
//! carrying the backend's optional `message` field; status codes whose
//! meaning depends on the operation (409 on a friend request vs. on a
//! response) are left as `Backend` and translated by the caller.

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;

use crate::core::{HuddleError, HuddleResult, SessionContext};

use super::types::{
    CreatedNoteResponse, ErrorBody, EventRequestDto, EventRequestResponse, EventRequestsPayload,
    FriendRequest, FriendsPayload, NoteDto, NotesPayload, RegisterResponse, RequestsPayload,
    SearchPayload, SentRequestPayload, SigninResponse, User,
};

/// Which side of the friend-request history to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestDirection {
    Received,
    Sent,
}

impl RequestDirection {
    fn as_path(&self) -> &'static str {
        match self {
            RequestDirection::Received => "received",
            RequestDirection::Sent => "sent",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_auth(&self, req: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        match &session.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn fail(res: Response) -> HuddleError {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("request failed ({})", status));
        match status {
            401 | 403 => HuddleError::Unauthenticated,
            404 => HuddleError::NotFound(message),
            _ => HuddleError::Backend { status, message },
        }
    }

    /// POST /customer. Returns the new account id when the backend sends one.
    pub async fn register(
        &self,
        name: &str,
        last_name: &str,
        age: u32,
        email: &str,
        password: &str,
    ) -> HuddleResult<Option<String>> {
        let res = self
            .http
            .post(self.url("/customer"))
            .json(&json!({
                "name": name,
                "lastName": last_name,
                "age": age,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let text = res.text().await.unwrap_or_default();
        let parsed: RegisterResponse = serde_json::from_str(&text).unwrap_or_default();
        Ok(parsed.id)
    }

    /// POST /auth/signin. Tolerates both token field spellings and both
    /// customer id shapes.
    pub async fn signin(&self, email: &str, password: &str) -> HuddleResult<SessionContext> {
        let res = self
            .http
            .post(self.url("/auth/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let parsed: SigninResponse = res.json().await?;
        let access_token = parsed.bearer().map(|t| t.to_string());
        let customer_id = parsed.customer_id();
        if customer_id.is_none() && access_token.is_none() {
            return Err(HuddleError::Backend {
                status: 200,
                message: "sign-in response carried no token or customer id".to_string(),
            });
        }
        Ok(SessionContext {
            customer_id,
            access_token,
        })
    }

    /// GET /customer/:id
    pub async fn get_profile(
        &self,
        session: &SessionContext,
        customer_id: &str,
    ) -> HuddleResult<User> {
        let url = self.url(&format!("/customer/{}", urlencoding::encode(customer_id)));
        let res = self.with_auth(self.http.get(url), session).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        Ok(res.json().await?)
    }

    /// GET /customer/:id/notes
    pub async fn list_notes(
        &self,
        session: &SessionContext,
        customer_id: &str,
    ) -> HuddleResult<Vec<NoteDto>> {
        let url = self.url(&format!(
            "/customer/{}/notes",
            urlencoding::encode(customer_id)
        ));
        let res = self.with_auth(self.http.get(url), session).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let payload: NotesPayload = res.json().await?;
        Ok(payload.into_vec())
    }

    /// POST /note. Returns the created note id when the backend sends one.
    pub async fn create_note(
        &self,
        session: &SessionContext,
        customer_id: &str,
        title: &str,
        description: &str,
        date: DateTime<Utc>,
    ) -> HuddleResult<Option<String>> {
        let res = self
            .with_auth(self.http.post(self.url("/note")), session)
            .json(&json!({
                "title": title,
                "description": description,
                "date": date.to_rfc3339(),
                "customerId": customer_id,
            }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let text = res.text().await.unwrap_or_default();
        let parsed: CreatedNoteResponse = serde_json::from_str(&text).unwrap_or_default();
        Ok(parsed.id)
    }

    /// DELETE /note/:id
    pub async fn delete_note(&self, session: &SessionContext, note_id: &str) -> HuddleResult<()> {
        let url = self.url(&format!("/note/{}", urlencoding::encode(note_id)));
        let res = self.with_auth(self.http.delete(url), session).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        Ok(())
    }

    /// POST /friendship/search/:userId
    pub async fn search_user(
        &self,
        session: &SessionContext,
        email: &str,
    ) -> HuddleResult<Option<User>> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/search/{}",
            urlencoding::encode(user_id)
        ));
        let res = self
            .with_auth(self.http.post(url), session)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let payload: SearchPayload = res.json().await?;
        Ok(payload.into_user())
    }

    /// POST /friendship/request/:userId. Returns the created request when
    /// the backend echoes it back.
    pub async fn send_friend_request(
        &self,
        session: &SessionContext,
        email: &str,
    ) -> HuddleResult<Option<FriendRequest>> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/request/{}",
            urlencoding::encode(user_id)
        ));
        let res = self
            .with_auth(self.http.post(url), session)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let text = res.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<SentRequestPayload>(&text)
            .ok()
            .and_then(SentRequestPayload::into_request))
    }

    /// POST /friendship/respond/:userId
    pub async fn respond_friend_request(
        &self,
        session: &SessionContext,
        request_id: &str,
        accept: bool,
    ) -> HuddleResult<()> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/respond/{}",
            urlencoding::encode(user_id)
        ));
        let res = self
            .with_auth(self.http.post(url), session)
            .json(&json!({ "requestId": request_id, "accept": accept }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        Ok(())
    }

    /// GET /friendship/friends/:userId
    pub async fn list_friends(&self, session: &SessionContext) -> HuddleResult<Vec<User>> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/friends/{}",
            urlencoding::encode(user_id)
        ));
        let res = self.with_auth(self.http.get(url), session).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let payload: FriendsPayload = res.json().await?;
        Ok(payload.into_vec())
    }

    /// GET /friendship/requests/:userId/{received,sent}
    pub async fn list_friend_requests(
        &self,
        session: &SessionContext,
        direction: RequestDirection,
    ) -> HuddleResult<Vec<FriendRequest>> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/requests/{}/{}",
            urlencoding::encode(user_id),
            direction.as_path()
        ));
        let res = self.with_auth(self.http.get(url), session).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let payload: RequestsPayload = res.json().await?;
        Ok(payload.into_vec())
    }

    /// POST /friendship/request-event/:userId. Creates the proposal and
    /// returns the backend's availability verdict for the recipient.
    pub async fn send_event_request(
        &self,
        session: &SessionContext,
        email: &str,
        title: &str,
        description: &str,
        date: DateTime<Utc>,
    ) -> HuddleResult<EventRequestResponse> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/request-event/{}",
            urlencoding::encode(user_id)
        ));
        let res = self
            .with_auth(self.http.post(url), session)
            .json(&json!({
                "email": email,
                "title": title,
                "description": description,
                "date": date.to_rfc3339(),
            }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let text = res.text().await.unwrap_or_default();
        let parsed: EventRequestResponse = serde_json::from_str(&text).unwrap_or_default();
        Ok(parsed)
    }

    /// POST /friendship/respond-event/:userId
    pub async fn respond_event_request(
        &self,
        session: &SessionContext,
        request_id: &str,
        accept: bool,
    ) -> HuddleResult<()> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/respond-event/{}",
            urlencoding::encode(user_id)
        ));
        let res = self
            .with_auth(self.http.post(url), session)
            .json(&json!({ "requestId": request_id, "accept": accept }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        Ok(())
    }

    /// GET /friendship/event-requests/:userId/received
    pub async fn list_event_requests_received(
        &self,
        session: &SessionContext,
    ) -> HuddleResult<Vec<EventRequestDto>> {
        let user_id = session.require_user()?;
        let url = self.url(&format!(
            "/friendship/event-requests/{}/received",
            urlencoding::encode(user_id)
        ));
        let res = self.with_auth(self.http.get(url), session).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res).await);
        }
        let payload: EventRequestsPayload = res.json().await?;
        Ok(payload.into_vec())
    }
}
