//! Wire types for the hangout backend.
//!
//! The backend is loose about response shapes: list endpoints sometimes
//! return a bare array and sometimes a wrapped object, sign-in spells its
//! token field two ways, and ids show up as strings or numbers depending on
//! the endpoint. These types absorb that drift in one place so the rest of
//! the crate only sees well-formed data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ids come back as strings or numbers depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Num(i64),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            IdRepr::Str(s) => s,
            IdRepr::Num(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(IdRepr::deserialize(d)?.into_string())
}

fn de_opt_id<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(d)?.map(IdRepr::into_string))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Best label for display, falling back through name, email, id.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Lifecycle shared by friend requests and event proposals. Created
/// `Pending`, resolved exactly once, never deleted.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

// Anything the backend sends that isn't a known terminal status is treated
// as pending, matching how the original client rendered `status || "pending"`.
impl<'de> Deserialize<'de> for ProposalStatus {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        Ok(match raw.to_ascii_lowercase().as_str() {
            "accepted" => ProposalStatus::Accepted,
            "declined" => ProposalStatus::Declined,
            _ => ProposalStatus::Pending,
        })
    }
}

impl ProposalStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Declined => "declined",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(rename = "fromUserId", default, deserialize_with = "de_opt_id")]
    pub from_user_id: Option<String>,
    #[serde(rename = "toUserId", default, deserialize_with = "de_opt_id")]
    pub to_user_id: Option<String>,
    #[serde(default)]
    pub status: ProposalStatus,
    /// Counterparty summary the backend attaches for display.
    #[serde(default)]
    pub user: Option<User>,
}

/// A hangout proposal as the backend returns it: event fields are flattened
/// onto the request rather than nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequestDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(rename = "fromUserId", default, deserialize_with = "de_opt_id")]
    pub from_user_id: Option<String>,
    #[serde(rename = "toUserId", default, deserialize_with = "de_opt_id")]
    pub to_user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Backend "note", the storage shape of a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDto {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityDto {
    #[serde(rename = "isAvailable", default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRequestResponse {
    #[serde(default)]
    pub availability: Option<AvailabilityDto>,
    #[serde(default)]
    pub request: Option<EventRequestDto>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerRef {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SigninResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
}

impl SigninResponse {
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().or(self.access_token.as_deref())
    }

    pub fn customer_id(&self) -> Option<String> {
        self.customer
            .as_ref()
            .map(|c| c.id.clone())
            .or_else(|| self.id.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatedNoteResponse {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
}

/// Optional `message` on any non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum SearchPayload {
    Wrapped { user: User },
    Bare(User),
    Other(Value),
}

impl SearchPayload {
    pub fn into_user(self) -> Option<User> {
        match self {
            SearchPayload::Wrapped { user } | SearchPayload::Bare(user) => {
                if user.id.is_empty() {
                    None
                } else {
                    Some(user)
                }
            }
            SearchPayload::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum SentRequestPayload {
    Wrapped { request: FriendRequest },
    Bare(FriendRequest),
    Other(Value),
}

impl SentRequestPayload {
    pub fn into_request(self) -> Option<FriendRequest> {
        match self {
            SentRequestPayload::Wrapped { request } | SentRequestPayload::Bare(request) => {
                if request.id.is_empty() {
                    None
                } else {
                    Some(request)
                }
            }
            SentRequestPayload::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum FriendsPayload {
    Wrapped { friends: Vec<User> },
    Bare(Vec<User>),
    Other(Value),
}

impl FriendsPayload {
    pub fn into_vec(self) -> Vec<User> {
        match self {
            FriendsPayload::Wrapped { friends } => friends,
            FriendsPayload::Bare(friends) => friends,
            FriendsPayload::Other(_) => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum RequestsPayload {
    Wrapped { requests: Vec<FriendRequest> },
    Bare(Vec<FriendRequest>),
    Other(Value),
}

impl RequestsPayload {
    pub fn into_vec(self) -> Vec<FriendRequest> {
        match self {
            RequestsPayload::Wrapped { requests } => requests,
            RequestsPayload::Bare(requests) => requests,
            RequestsPayload::Other(_) => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum EventRequestsPayload {
    Wrapped { requests: Vec<EventRequestDto> },
    Bare(Vec<EventRequestDto>),
    Other(Value),
}

impl EventRequestsPayload {
    pub fn into_vec(self) -> Vec<EventRequestDto> {
        match self {
            EventRequestsPayload::Wrapped { requests } => requests,
            EventRequestsPayload::Bare(requests) => requests,
            EventRequestsPayload::Other(_) => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum NotesPayload {
    Wrapped { notes: Vec<NoteDto> },
    Bare(Vec<NoteDto>),
    Other(Value),
}

impl NotesPayload {
    pub fn into_vec(self) -> Vec<NoteDto> {
        match self {
            NotesPayload::Wrapped { notes } => notes,
            NotesPayload::Bare(notes) => notes,
            NotesPayload::Other(_) => Vec::new(),
        }
    }
}
