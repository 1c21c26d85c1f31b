//! Post queries: the publication rule in SQL and relation loading.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Author, Category, Location, PostEntry, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{POSTS_PER_PAGE, Page, PageRequest, total_pages};
use blogicum_core::ports::PostRepository;
use blogicum_core::visibility::{PostFilter, PostScope};

use super::entity::{category, comment, location, post, user};
use super::postgres_base::query_err;
use super::postgres_repo::PostgresPostRepository;

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: Uuid,
    comment_count: i64,
}

/// Restrict `query` to posts that are publicly visible at `now`.
///
/// Posts without a category pass the category check, hence the left join.
pub(crate) fn visible(query: Select<post::Entity>, now: DateTime<Utc>) -> Select<post::Entity> {
    query
        .join(JoinType::LeftJoin, post::Relation::Category.def())
        .filter(post::Column::IsPublished.eq(true))
        .filter(post::Column::PubDate.lte(now))
        .filter(
            Condition::any()
                .add(post::Column::CategoryId.is_null())
                .add(category::Column::IsPublished.eq(true)),
        )
}

/// Translate a [`PostFilter`] into a select, newest first.
pub(crate) fn filtered(filter: &PostFilter) -> Select<post::Entity> {
    let mut query = post::Entity::find();
    if filter.scope == PostScope::Visible {
        query = visible(query, filter.now);
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(post::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(post::Column::AuthorId.eq(author_id));
    }
    query.order_by_desc(post::Column::PubDate)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_entry(
        &self,
        id: Uuid,
        filter: &PostFilter,
    ) -> Result<Option<PostEntry>, RepoError> {
        let found = filtered(filter)
            .filter(post::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        match found {
            Some(model) => Ok(self
                .load_entries(vec![model], filter.with_comment_count)
                .await?
                .pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostEntry>, RepoError> {
        let paginator = filtered(filter).paginate(&self.db, POSTS_PER_PAGE);
        let total_items = paginator.num_items().await.map_err(query_err)?;
        let number = page.resolve(total_pages(total_items, POSTS_PER_PAGE));

        let models = paginator
            .fetch_page(number - 1)
            .await
            .map_err(query_err)?;
        let items = self.load_entries(models, filter.with_comment_count).await?;

        Ok(Page::new(items, number, POSTS_PER_PAGE, total_items))
    }
}

impl PostgresPostRepository {
    /// Attach authors, categories, locations and optionally comment counts,
    /// with one query per relation.
    async fn load_entries(
        &self,
        posts: Vec<post::Model>,
        with_comment_count: bool,
    ) -> Result<Vec<PostEntry>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: BTreeSet<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let category_ids: BTreeSet<Uuid> = posts.iter().filter_map(|p| p.category_id).collect();
        let location_ids: BTreeSet<Uuid> = posts.iter().filter_map(|p| p.location_id).collect();
        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let authors: HashMap<Uuid, Author> = user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|model| {
                let user = User::from(model);
                (user.id, Author::from(&user))
            })
            .collect();

        let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(query_err)?
                .into_iter()
                .map(|model| (model.id, model.into()))
                .collect()
        };

        let locations: HashMap<Uuid, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            location::Entity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(query_err)?
                .into_iter()
                .map(|model| (model.id, model.into()))
                .collect()
        };

        let comment_counts: Option<HashMap<Uuid, i64>> = if with_comment_count {
            let rows = comment::Entity::find()
                .select_only()
                .column(comment::Column::PostId)
                .column_as(
                    Expr::col((comment::Entity, comment::Column::Id)).count(),
                    "comment_count",
                )
                .filter(comment::Column::PostId.is_in(post_ids))
                .group_by(comment::Column::PostId)
                .into_model::<CommentCount>()
                .all(&self.db)
                .await
                .map_err(query_err)?;
            Some(
                rows.into_iter()
                    .map(|row| (row.post_id, row.comment_count))
                    .collect(),
            )
        } else {
            None
        };

        posts
            .into_iter()
            .map(|model| {
                let author = authors.get(&model.author_id).cloned().ok_or_else(|| {
                    RepoError::Constraint(format!("post {} has no author", model.id))
                })?;
                let category = model.category_id.and_then(|id| categories.get(&id).cloned());
                let location = model.location_id.and_then(|id| locations.get(&id).cloned());
                let comment_count = comment_counts
                    .as_ref()
                    .map(|counts| counts.get(&model.id).copied().unwrap_or(0) as u64);

                Ok(PostEntry {
                    post: model.into(),
                    author,
                    category,
                    location,
                    comment_count,
                })
            })
            .collect()
    }
}
