use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::Repositories;
use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::error::RepoError;

use super::repositories::InMemoryRepository;

/// All tables of the blog.
#[derive(Default)]
pub struct Tables {
    pub users: HashMap<Uuid, User>,
    pub categories: HashMap<Uuid, Category>,
    pub locations: HashMap<Uuid, Location>,
    pub posts: HashMap<Uuid, Post>,
    pub comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn remove_post(&mut self, id: Uuid) -> bool {
        if self.posts.remove(&id).is_none() {
            return false;
        }
        self.comments.retain(|_, comment| comment.post_id != id);
        true
    }

    fn remove_user(&mut self, id: Uuid) -> bool {
        if self.users.remove(&id).is_none() {
            return false;
        }
        let owned: Vec<Uuid> = self
            .posts
            .values()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        for post_id in owned {
            self.remove_post(post_id);
        }
        self.comments.retain(|_, comment| comment.author_id != id);
        true
    }

    fn remove_category(&mut self, id: Uuid) -> bool {
        if self.categories.remove(&id).is_none() {
            return false;
        }
        for post in self.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        true
    }

    fn remove_location(&mut self, id: Uuid) -> bool {
        if self.locations.remove(&id).is_none() {
            return false;
        }
        for post in self.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        true
    }
}

fn missing(table: &str, id: Uuid) -> RepoError {
    RepoError::Constraint(format!("{table} {id} does not exist"))
}

/// A row type stored in [`Tables`].
pub trait Record: Clone + Send + Sync + 'static {
    fn key(&self) -> Uuid;

    fn table(tables: &Tables) -> &HashMap<Uuid, Self>;

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Unique and foreign-key checks run before a write.
    fn check(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Delete the row and apply the on-delete rules. False if it did not exist.
    fn remove(tables: &mut Tables, id: Uuid) -> bool;
}

impl Record for User {
    fn key(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        let taken = tables
            .users
            .values()
            .any(|other| other.id != self.id && other.username == self.username);
        if taken {
            return Err(RepoError::Constraint(format!(
                "username {} already exists",
                self.username
            )));
        }
        Ok(())
    }

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_user(id)
    }
}

impl Record for Category {
    fn key(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        let taken = tables
            .categories
            .values()
            .any(|other| other.id != self.id && other.slug == self.slug);
        if taken {
            return Err(RepoError::Constraint(format!("slug {} already exists", self.slug)));
        }
        Ok(())
    }

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_category(id)
    }
}

impl Record for Location {
    fn key(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.locations
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.locations
    }

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_location(id)
    }
}

impl Record for Post {
    fn key(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing("user", self.author_id));
        }
        if let Some(id) = self.category_id.filter(|id| !tables.categories.contains_key(id)) {
            return Err(missing("category", id));
        }
        if let Some(id) = self.location_id.filter(|id| !tables.locations.contains_key(id)) {
            return Err(missing("location", id));
        }
        Ok(())
    }

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_post(id)
    }
}

impl Record for Comment {
    fn key(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.posts.contains_key(&self.post_id) {
            return Err(missing("post", self.post_id));
        }
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing("user", self.author_id));
        }
        Ok(())
    }

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.comments.remove(&id).is_some()
    }
}

/// Shared in-memory database. Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub(crate) tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repositories backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(InMemoryRepository::<User>::new(self.clone())),
            categories: Arc::new(InMemoryRepository::<Category>::new(self.clone())),
            locations: Arc::new(InMemoryRepository::<Location>::new(self.clone())),
            posts: Arc::new(InMemoryRepository::<Post>::new(self.clone())),
            comments: Arc::new(InMemoryRepository::<Comment>::new(self.clone())),
        }
    }
}
