use std::marker::PhantomData;

use async_trait::async_trait;
use uuid::Uuid;

use blogicum_core::domain::{
    Author, Category, Comment, CommentEntry, Location, Post, PostEntry, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{POSTS_PER_PAGE, Page, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::visibility::PostFilter;

use super::store::{InMemoryStore, Record, Tables};

/// Generic in-memory repository over one table of an [`InMemoryStore`].
pub struct InMemoryRepository<T> {
    store: InMemoryStore,
    _record: PhantomData<fn() -> T>,
}

impl<T> InMemoryRepository<T> {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryLocationRepository = InMemoryRepository<Location>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

#[async_trait]
impl<T: Record> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(T::table(&tables).get(&id).cloned())
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.store.tables.write().await;
        entity.check(&tables)?;
        T::table_mut(&mut tables).insert(entity.key(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if T::remove(&mut tables, id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|category| category.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {}

fn author_of(tables: &Tables, author_id: Uuid) -> Result<Author, RepoError> {
    tables
        .users
        .get(&author_id)
        .map(Author::from)
        .ok_or_else(|| RepoError::Constraint(format!("user {author_id} does not exist")))
}

fn post_entry(tables: &Tables, post: &Post, with_comment_count: bool) -> Result<PostEntry, RepoError> {
    let comment_count = with_comment_count.then(|| {
        tables
            .comments
            .values()
            .filter(|comment| comment.post_id == post.id)
            .count() as u64
    });

    Ok(PostEntry {
        post: post.clone(),
        author: author_of(tables, post.author_id)?,
        category: post
            .category_id
            .and_then(|id| tables.categories.get(&id).cloned()),
        location: post
            .location_id
            .and_then(|id| tables.locations.get(&id).cloned()),
        comment_count,
    })
}

/// Posts admitted by `filter`, newest `pub_date` first.
fn matching<'t>(tables: &'t Tables, filter: &PostFilter) -> Vec<&'t Post> {
    let mut posts: Vec<&Post> = tables
        .posts
        .values()
        .filter(|post| {
            let category = post.category_id.and_then(|id| tables.categories.get(&id));
            filter.admits(post, category)
        })
        .collect();
    posts.sort_by(|a, b| {
        b.pub_date
            .cmp(&a.pub_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    posts
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_entry(
        &self,
        id: Uuid,
        filter: &PostFilter,
    ) -> Result<Option<PostEntry>, RepoError> {
        let tables = self.store.tables.read().await;
        let Some(post) = tables.posts.get(&id) else {
            return Ok(None);
        };
        let category = post.category_id.and_then(|id| tables.categories.get(&id));
        if !filter.admits(post, category) {
            return Ok(None);
        }
        post_entry(&tables, post, filter.with_comment_count).map(Some)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostEntry>, RepoError> {
        let tables = self.store.tables.read().await;
        let page = Page::from_items(matching(&tables, filter), page, POSTS_PER_PAGE);
        let items = page
            .items
            .iter()
            .map(|post| post_entry(&tables, post, filter.with_comment_count))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page.number, page.per_page, page.total_items))
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        comments
            .into_iter()
            .map(|comment| {
                Ok(CommentEntry {
                    comment: comment.clone(),
                    author: author_of(&tables, comment.author_id)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::*;

    struct Fixture {
        users: InMemoryUserRepository,
        categories: InMemoryCategoryRepository,
        locations: InMemoryLocationRepository,
        posts: InMemoryPostRepository,
        comments: InMemoryCommentRepository,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        Fixture {
            users: InMemoryRepository::new(store.clone()),
            categories: InMemoryRepository::new(store.clone()),
            locations: InMemoryRepository::new(store.clone()),
            posts: InMemoryRepository::new(store.clone()),
            comments: InMemoryRepository::new(store),
        }
    }

    async fn user(f: &Fixture, username: &str) -> User {
        f.users
            .save(User::new(username.into(), String::new(), "hash".into()))
            .await
            .unwrap()
    }

    async fn post(f: &Fixture, author: &User, days_ago: i64) -> Post {
        let pub_date = Utc::now() - TimeDelta::days(days_ago);
        f.posts
            .save(Post::new(author.id, format!("Day {days_ago}"), "text".into(), pub_date))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let f = fixture();
        user(&f, "anna").await;

        let result = f
            .users
            .save(User::new("anna".into(), String::new(), "hash".into()))
            .await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_post_requires_existing_author() {
        let f = fixture();
        let orphan = Post::new(Uuid::new_v4(), "T".into(), "x".into(), Utc::now());

        assert!(matches!(f.posts.save(orphan).await, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_posts_and_comments() {
        let f = fixture();
        let anna = user(&f, "anna").await;
        let boris = user(&f, "boris").await;
        let annas_post = post(&f, &anna, 1).await;
        let boris_post = post(&f, &boris, 1).await;
        let on_boris = f
            .comments
            .save(Comment::new(boris_post.id, anna.id, "hi".into()))
            .await
            .unwrap();
        let on_anna = f
            .comments
            .save(Comment::new(annas_post.id, boris.id, "hey".into()))
            .await
            .unwrap();

        f.users.delete(anna.id).await.unwrap();

        assert!(f.posts.find_by_id(annas_post.id).await.unwrap().is_none());
        assert!(f.comments.find_by_id(on_boris.id).await.unwrap().is_none());
        assert!(f.comments.find_by_id(on_anna.id).await.unwrap().is_none());
        assert!(f.posts.find_by_id(boris_post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deleting_category_and_location_nulls_references() {
        let f = fixture();
        let anna = user(&f, "anna").await;
        let travel = f
            .categories
            .save(Category::new("Travel".into(), "Trips".into(), "travel".into()))
            .await
            .unwrap();
        let baikal = f.locations.save(Location::new("Baikal".into())).await.unwrap();
        let mut p = Post::new(anna.id, "T".into(), "x".into(), Utc::now());
        p.category_id = Some(travel.id);
        p.location_id = Some(baikal.id);
        let p = f.posts.save(p).await.unwrap();

        f.categories.delete(travel.id).await.unwrap();
        f.locations.delete(baikal.id).await.unwrap();

        let stored = f.posts.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.category_id, None);
        assert_eq!(stored.location_id, None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let f = fixture();
        assert!(matches!(f.posts.delete(Uuid::new_v4()).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_counts_comments() {
        let f = fixture();
        let anna = user(&f, "anna").await;
        let older = post(&f, &anna, 3).await;
        let newer = post(&f, &anna, 1).await;
        for text in ["one", "two"] {
            f.comments
                .save(Comment::new(older.id, anna.id, text.into()))
                .await
                .unwrap();
        }

        let filter = PostFilter::visible(Utc::now()).with_comment_count();
        let page = f.posts.list(&filter, PageRequest::first()).await.unwrap();

        let ids: Vec<Uuid> = page.items.iter().map(|e| e.post.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(page.items[0].comment_count, Some(0));
        assert_eq!(page.items[1].comment_count, Some(2));
        assert_eq!(page.items[1].author.username, "anna");
    }

    #[tokio::test]
    async fn test_list_clamps_to_last_page() {
        let f = fixture();
        let anna = user(&f, "anna").await;
        for day in 1..=12 {
            post(&f, &anna, day).await;
        }

        let page = f
            .posts
            .list(&PostFilter::visible(Utc::now()), PageRequest::number(40))
            .await
            .unwrap();

        assert_eq!(page.number, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].post.title, "Day 12");
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let f = fixture();
        let anna = user(&f, "anna").await;
        let p = post(&f, &anna, 1).await;
        let mut first = Comment::new(p.id, anna.id, "first".into());
        first.created_at = Utc::now() - TimeDelta::minutes(5);
        let second = Comment::new(p.id, anna.id, "second".into());
        f.comments.save(second).await.unwrap();
        f.comments.save(first).await.unwrap();

        let texts: Vec<String> = f
            .comments
            .list_for_post(p.id)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.comment.text)
            .collect();

        assert_eq!(texts, vec!["first", "second"]);
    }
}
