//! Club documents and their membership lists.
//!
//! The detector and reporter work on the store-agnostic model below.
//! `MongoClubReader` fills it from the `clubs` collection, resolving each
//! membership's user reference against the `users` collection in a single
//! batched lookup.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::Database;
use serde::Deserialize;
use tracing::debug;

use crate::error::AuditError;

/// A club with its membership list, as returned by the store.
#[derive(Debug, Clone)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub members: Vec<Membership>,
}

/// One membership entry. Role metadata is not loaded; a membership whose
/// user reference could not be resolved to an id carries `None`.
#[derive(Debug, Clone)]
pub struct Membership {
    pub user: Option<UserRef>,
}

/// The user side of a membership, projected to what the report needs.
#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Source of clubs for the audit. The driver is written against this seam;
/// tests supply an in-memory implementation.
#[async_trait]
pub trait ClubReader {
    /// Every club in the store, with member user references resolved.
    async fn list_clubs_with_members(&self) -> Result<Vec<Club>, AuditError>;
}

// ============================================================================
// Wire documents
// ============================================================================

#[derive(Debug, Deserialize)]
struct ClubDoc {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    members: Vec<MembershipDoc>,
}

#[derive(Debug, Deserialize)]
struct MembershipDoc {
    #[serde(default)]
    user: Option<Bson>,
}

#[derive(Debug, Deserialize)]
struct UserDoc {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Old club documents store `members: null` instead of an empty array.
fn null_as_empty<'de, D>(de: D) -> Result<Vec<MembershipDoc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<MembershipDoc>>::deserialize(de)?.unwrap_or_default())
}

/// Ids are opaque: ObjectIds render as hex, strings as themselves.
fn id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The raw id behind a membership's `user` field, if any. Some legacy
/// documents embed the user document instead of a bare reference.
fn member_user_id(user: &Bson) -> Option<&Bson> {
    match user {
        Bson::Null | Bson::Undefined => None,
        Bson::Document(embedded) => embedded.get("_id"),
        other => Some(other),
    }
}

// ============================================================================
// Mongo-backed reader
// ============================================================================

pub struct MongoClubReader {
    db: Database,
    socket_timeout: Duration,
}

impl MongoClubReader {
    pub fn new(db: Database, socket_timeout: Duration) -> Self {
        Self { db, socket_timeout }
    }

    async fn load_clubs(&self) -> Result<Vec<ClubDoc>, AuditError> {
        let clubs = self.db.collection::<ClubDoc>("clubs");
        let cursor = tokio::time::timeout(self.socket_timeout, clubs.find(doc! {}))
            .await
            .map_err(|_| query_timeout("clubs"))?
            .map_err(|e| AuditError::Query(e.into()))?;
        tokio::time::timeout(self.socket_timeout, cursor.try_collect())
            .await
            .map_err(|_| query_timeout("clubs"))?
            .map_err(|e| AuditError::Query(e.into()))
    }

    async fn load_users(&self, ids: Vec<Bson>) -> Result<HashMap<String, UserDoc>, AuditError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self.db.collection::<UserDoc>("users");
        let find = users
            .find(doc! { "_id": { "$in": ids } })
            .projection(doc! { "name": 1, "email": 1 });
        let cursor = tokio::time::timeout(self.socket_timeout, find)
            .await
            .map_err(|_| query_timeout("users"))?
            .map_err(|e| AuditError::Query(e.into()))?;
        let docs: Vec<UserDoc> = tokio::time::timeout(self.socket_timeout, cursor.try_collect())
            .await
            .map_err(|_| query_timeout("users"))?
            .map_err(|e| AuditError::Query(e.into()))?;

        Ok(docs
            .into_iter()
            .map(|user| (id_string(&user.id), user))
            .collect())
    }
}

fn query_timeout(collection: &str) -> AuditError {
    AuditError::Query(anyhow::anyhow!(
        "timed out reading the {collection} collection"
    ))
}

#[async_trait]
impl ClubReader for MongoClubReader {
    async fn list_clubs_with_members(&self) -> Result<Vec<Club>, AuditError> {
        let docs = self.load_clubs().await?;

        // One batched lookup for every user id referenced by any club.
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for club in &docs {
            for member in &club.members {
                if let Some(id) = member.user.as_ref().and_then(member_user_id) {
                    if seen.insert(id_string(id)) {
                        ids.push(id.clone());
                    }
                }
            }
        }
        let users = self.load_users(ids).await?;

        debug!(
            clubs = docs.len(),
            users = users.len(),
            "loaded club membership data"
        );

        Ok(docs
            .into_iter()
            .map(|club| resolve_club(club, &users))
            .collect())
    }
}

fn resolve_club(doc: ClubDoc, users: &HashMap<String, UserDoc>) -> Club {
    let id = id_string(&doc.id);
    let members = doc
        .members
        .iter()
        .map(|member| Membership {
            user: member.user.as_ref().and_then(member_user_id).map(|raw| {
                let user_id = id_string(raw);
                let resolved = users.get(&user_id);
                UserRef {
                    id: user_id,
                    // A dangling reference still counts; the report falls
                    // back to the raw id when no user document exists.
                    name: resolved.and_then(|u| u.name.clone()),
                    email: resolved.and_then(|u| u.email.clone()),
                }
            }),
        })
        .collect();

    Club {
        name: doc.name.unwrap_or_else(|| id.clone()),
        id,
        members,
    }
}
