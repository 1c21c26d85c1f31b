//! Ownership guard and redirect destinations.
//!
//! Posts and comments may only be changed by their author. Anyone else who
//! reaches an edit or delete flow is sent back to the detail page of the
//! entity, without an error.

use std::fmt;

use uuid::Uuid;

use crate::domain::{Comment, Post};

/// A page the client is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Index,
    PostDetail(Uuid),
    Profile(String),
}

impl Destination {
    pub fn path(&self) -> String {
        match self {
            Destination::Index => "/".to_string(),
            Destination::PostDetail(id) => format!("/posts/{id}/"),
            Destination::Profile(username) => format!("/profile/{username}/"),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// An entity with a single owning author.
pub trait Authored {
    /// Entity name used in logs.
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn author_id(&self) -> Uuid;

    /// Where a denied requester is sent.
    fn detail(&self) -> Destination;
}

impl Authored for Post {
    const KIND: &'static str = "post";

    fn id(&self) -> Uuid {
        self.id
    }

    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn detail(&self) -> Destination {
        Destination::PostDetail(self.id)
    }
}

impl Authored for Comment {
    const KIND: &'static str = "comment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn detail(&self) -> Destination {
        Destination::PostDetail(self.post_id)
    }
}

/// Result of the ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied(Destination),
}

/// Compare `requester` with the author of `entity`.
pub fn authorize<E: Authored>(requester: Uuid, entity: &E) -> Access {
    if entity.author_id() == requester {
        Access::Granted
    } else {
        tracing::info!(
            kind = E::KIND,
            entity_id = %entity.id(),
            requester = %requester,
            "Non-author tried to modify entity, redirecting"
        );
        Access::Denied(entity.detail())
    }
}

/// Whether an optional requester wrote `entity`.
pub fn is_author<E: Authored>(requester: Option<Uuid>, entity: &E) -> bool {
    requester.is_some_and(|id| id == entity.author_id())
}
