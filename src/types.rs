//! Core types for todo-api
//!
//! Todos exist in two forms: [`TodoDocument`] is what the document store
//! persists, [`Todo`] is what HTTP clients see. They differ only in how the
//! identifier is encoded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use utoipa::ToSchema;

use crate::error::Error;

/// Store-assigned 12-byte document identifier.
///
/// Layout: 4-byte big-endian creation seconds, 5 bytes fixed per process,
/// 3-byte big-endian counter. Rendered as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const LEN: usize = 12;

    /// Generate a fresh identifier
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let counter = next_counter();

        let mut bytes = [0u8; Self::LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Canonical textual encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

fn process_unique() -> &'static [u8; 5] {
    static VALUE: OnceLock<[u8; 5]> = OnceLock::new();
    VALUE.get_or_init(|| {
        let random = uuid::Uuid::new_v4();
        let mut value = [0u8; 5];
        value.copy_from_slice(&random.as_bytes()[..5]);
        value
    })
}

fn next_counter() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| {
        let random = uuid::Uuid::new_v4();
        let b = random.as_bytes();
        AtomicU32::new(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    });
    counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LEN * 2 {
            return Err(Error::InvalidId(s.to_string()));
        }
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A todo as persisted in the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub completed: bool,
    #[serde(rename = "createAt")]
    pub created_at: DateTime<Utc>,
}

impl TodoDocument {
    /// A new, not yet completed todo stamped with the current time
    pub fn new(title: String) -> Self {
        Self {
            id: ObjectId::new(),
            title,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// The fields an update may change
#[derive(Debug, Clone, PartialEq)]
pub struct TodoUpdate {
    pub title: String,
    pub completed: bool,
}

/// A todo as exchanged with HTTP clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Todo {
    /// Hex-encoded identifier
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// RFC 3339 creation timestamp
    #[serde(rename = "createAt")]
    pub created_at: DateTime<Utc>,
}

impl From<TodoDocument> for Todo {
    fn from(doc: TodoDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title,
            completed: doc.completed,
            created_at: doc.created_at,
        }
    }
}

impl TryFrom<Todo> for TodoDocument {
    type Error = Error;

    fn try_from(todo: Todo) -> Result<Self, Self::Error> {
        Ok(Self {
            id: todo.id.parse()?,
            title: todo.title,
            completed: todo.completed,
            created_at: todo.created_at,
        })
    }
}
