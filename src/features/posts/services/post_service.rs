use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::AuthenticatedUser;
use crate::features::comments::models::Comment;
use crate::features::posts::dtos::{CommentFeedDto, NewPostInput, PostFeedDto};
use crate::features::posts::models::{Post, PostWithComments};
use crate::features::users::models::User;
use crate::modules::storage::{FileDescriptor, LocalStore, StorageKind};

/// Service for post creation, deletion and the authorization-aware feed
pub struct PostService {
    pool: PgPool,
    store: Arc<LocalStore>,
}

impl PostService {
    pub fn new(pool: PgPool, store: Arc<LocalStore>) -> Self {
        Self { pool, store }
    }

    /// Resolve the feed for the requesting user.
    ///
    /// Elevated roles see every post; everyone else sees PUBLIC posts plus
    /// PRIVATE posts scoped to their group memberships, with teachers-only
    /// posts filtered out at read time. The merged feed is deduplicated and
    /// ordered by recency, and every post and comment carries its author's
    /// display name.
    pub async fn feed(&self, username: &str) -> Result<Vec<PostFeedDto>> {
        let user = self.get_user_by_name(username).await?.ok_or_else(|| {
            AppError::NotFound(format!("User '{}' not found", username))
        })?;

        let group_ids = self.group_ids_of_user(user.id).await?;

        let posts = if user.role.sees_all_posts() {
            self.all_posts_with_comments().await?
        } else if group_ids.is_empty() {
            // No memberships: the PRIVATE arm short-circuits instead of
            // issuing a query with an empty id list
            self.public_posts_with_comments(false).await?
        } else {
            // The two fetches are read-only and disjoint, so they can run
            // concurrently
            let (mut public, private) = tokio::try_join!(
                self.public_posts_with_comments(false),
                self.posts_in_groups_with_comments(&group_ids, false),
            )?;
            public.extend(private);
            public
        };

        let posts = merge_feed(posts);

        let author_ids = collect_author_ids(&posts);
        let usernames = self.usernames_for(&author_ids).await?;

        attach_author_names(posts, &usernames)
    }

    /// Every post regardless of visibility, for elevated roles
    async fn all_posts_with_comments(&self) -> Result<Vec<PostWithComments>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        self.with_comments(posts).await
    }

    /// All PUBLIC posts with comments
    async fn public_posts_with_comments(
        &self,
        include_teachers_only: bool,
    ) -> Result<Vec<PostWithComments>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE visibility = 'PUBLIC' AND (teachers_only = FALSE OR $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(include_teachers_only)
        .fetch_all(&self.pool)
        .await?;

        self.with_comments(posts).await
    }

    /// PRIVATE posts associated with any of the given groups, deduplicated
    /// by post id. Callers must not pass an empty list.
    async fn posts_in_groups_with_comments(
        &self,
        group_ids: &[Uuid],
        include_teachers_only: bool,
    ) -> Result<Vec<PostWithComments>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE visibility = 'PRIVATE'
              AND (teachers_only = FALSE OR $2)
              AND id IN (SELECT post_id FROM post_groups WHERE group_id = ANY($1))
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(group_ids)
        .bind(include_teachers_only)
        .fetch_all(&self.pool)
        .await?;

        self.with_comments(posts).await
    }

    /// Load the comments for the given posts in one query and pair them up.
    async fn with_comments(&self, posts: Vec<Post>) -> Result<Vec<PostWithComments>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = ANY($1) ORDER BY created_at",
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(attach_comments(posts, comments))
    }

    /// Create a post, its group mappings and its attachments.
    ///
    /// The post insert and the group mapping run in a single transaction;
    /// stored attachment files are cleaned up if the transaction fails.
    pub async fn create(
        &self,
        author: &AuthenticatedUser,
        input: NewPostInput,
    ) -> Result<PostFeedDto> {
        if input.teachers_only && !author.role.satisfies_teachers_only() {
            return Err(AppError::Forbidden(
                "Only teachers can create teachers-only posts".to_string(),
            ));
        }

        let mut descriptors: Vec<FileDescriptor> = Vec::with_capacity(input.attachments.len());
        for attachment in &input.attachments {
            match self
                .store
                .save(
                    StorageKind::Uploads,
                    &attachment.filename,
                    &attachment.mimetype,
                    &attachment.data,
                )
                .await
            {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => {
                    self.cleanup_attachments(&descriptors).await;
                    return Err(e);
                }
            }
        }

        let files = if descriptors.is_empty() {
            None
        } else {
            Some(Json(descriptors.clone()))
        };

        let result: Result<Post> = async {
            let mut tx = self.pool.begin().await?;

            let post = sqlx::query_as::<_, Post>(
                r#"
                INSERT INTO posts
                    (title, content, visibility, labels, user_id, video_link, files, teachers_only)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.visibility)
            .bind(&input.labels)
            .bind(author.id)
            .bind(&input.video_link)
            .bind(&files)
            .bind(input.teachers_only)
            .fetch_one(&mut *tx)
            .await?;

            for group_id in &input.group_ids {
                sqlx::query("INSERT INTO post_groups (post_id, group_id) VALUES ($1, $2)")
                    .bind(post.id)
                    .bind(group_id)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok(post)
        }
        .await;

        let post = match result {
            Ok(post) => post,
            Err(e) => {
                self.cleanup_attachments(&descriptors).await;
                return Err(e);
            }
        };

        info!(
            "Post {} created by {} ({} attachment(s), {} group(s))",
            post.id,
            author.username,
            descriptors.len(),
            input.group_ids.len()
        );

        Ok(feed_dto_for_new_post(post, &author.username))
    }

    /// Delete a post and its stored attachments.
    ///
    /// Only the author or an admin may delete; deleting a missing post logs
    /// a warning and still succeeds (idempotent).
    pub async fn delete(&self, requester: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(post) = post else {
            warn!("Post to delete not found: {}", id);
            return Ok(());
        };

        if post.user_id != requester.id && !requester.role.is_admin() {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this post".to_string(),
            ));
        }

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if let Some(files) = post.files {
            self.cleanup_attachments(&files.0).await;
        }

        info!("Post {} deleted by {}", id, requester.username);
        Ok(())
    }

    async fn cleanup_attachments(&self, descriptors: &[FileDescriptor]) {
        for descriptor in descriptors {
            self.store
                .remove(StorageKind::Uploads, &descriptor.filename)
                .await;
        }
    }

    async fn group_ids_of_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT group_id FROM user_groups WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn usernames_for(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, username FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn get_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

/// Pair each post with its comments. Posts without comments get an empty
/// list, never a placeholder entry.
fn attach_comments(posts: Vec<Post>, comments: Vec<Comment>) -> Vec<PostWithComments> {
    let mut by_post: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_post.entry(comment.post_id).or_default().push(comment);
    }

    posts
        .into_iter()
        .map(|post| {
            let comments = by_post.remove(&post.id).unwrap_or_default();
            PostWithComments { post, comments }
        })
        .collect()
}

/// Deduplicate by post id and order by created_at descending with an
/// id-descending tie-break for determinism.
fn merge_feed(mut posts: Vec<PostWithComments>) -> Vec<PostWithComments> {
    let mut seen = HashSet::new();
    posts.retain(|p| seen.insert(p.post.id));
    posts.sort_by(|a, b| {
        b.post
            .created_at
            .cmp(&a.post.created_at)
            .then(b.post.id.cmp(&a.post.id))
    });
    posts
}

fn collect_author_ids(posts: &[PostWithComments]) -> Vec<Uuid> {
    let mut ids = HashSet::new();
    for pwc in posts {
        ids.insert(pwc.post.user_id);
        for comment in &pwc.comments {
            ids.insert(comment.user_id);
        }
    }
    ids.into_iter().collect()
}

/// Attach author display names to every post and comment. An id that does
/// not resolve to a user is a data-integrity error, not a soft failure.
fn attach_author_names(
    posts: Vec<PostWithComments>,
    usernames: &HashMap<Uuid, String>,
) -> Result<Vec<PostFeedDto>> {
    posts
        .into_iter()
        .map(|pwc| {
            let author = resolve_author(usernames, pwc.post.user_id)?;

            let comments = pwc
                .comments
                .into_iter()
                .map(|comment| {
                    let author = resolve_author(usernames, comment.user_id)?;
                    Ok(CommentFeedDto {
                        id: comment.id,
                        content: comment.content,
                        user_id: comment.user_id,
                        author,
                        created_at: comment.created_at,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(PostFeedDto {
                id: pwc.post.id,
                title: pwc.post.title,
                content: pwc.post.content,
                visibility: pwc.post.visibility,
                labels: pwc.post.labels,
                user_id: pwc.post.user_id,
                author,
                video_link: pwc.post.video_link,
                files: pwc.post.files.map(|f| f.0),
                teachers_only: pwc.post.teachers_only,
                created_at: pwc.post.created_at,
                comments,
            })
        })
        .collect()
}

fn resolve_author(usernames: &HashMap<Uuid, String>, user_id: Uuid) -> Result<String> {
    usernames
        .get(&user_id)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("Unresolvable author id: {}", user_id)))
}

/// Feed representation of a freshly created post: no comments yet, the
/// author is the creator.
fn feed_dto_for_new_post(post: Post, author: &str) -> PostFeedDto {
    PostFeedDto {
        id: post.id,
        title: post.title,
        content: post.content,
        visibility: post.visibility,
        labels: post.labels,
        user_id: post.user_id,
        author: author.to_string(),
        video_link: post.video_link,
        files: post.files.map(|f| f.0),
        teachers_only: post.teachers_only,
        created_at: post.created_at,
        comments: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::posts::models::Visibility;
    use chrono::{DateTime, TimeZone, Utc};

    fn post(id: u128, user_id: Uuid, created_at: DateTime<Utc>, visibility: Visibility) -> Post {
        use fake::faker::lorem::en::Sentence;
        use fake::Fake;

        Post {
            id: Uuid::from_u128(id),
            title: format!("post-{}", id),
            content: Sentence(3..8).fake(),
            visibility,
            labels: None,
            user_id,
            video_link: None,
            files: None,
            teachers_only: false,
            created_at,
        }
    }

    fn comment_on(post_id: Uuid, user_id: Uuid, content: &str) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            post_id,
            user_id,
            created_at: Utc::now(),
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn posts_without_comments_get_an_empty_list() {
        let author = Uuid::new_v4();
        let p1 = post(1, author, at(2024, 1, 1), Visibility::Public);
        let p2 = post(2, author, at(2024, 1, 2), Visibility::Public);
        let comments = vec![comment_on(p2.id, author, "only on p2")];

        let paired = attach_comments(vec![p1, p2], comments);

        assert!(paired[0].comments.is_empty());
        assert_eq!(paired[1].comments.len(), 1);
    }

    #[test]
    fn comment_order_is_preserved_per_post() {
        let author = Uuid::new_v4();
        let p = post(1, author, at(2024, 1, 1), Visibility::Public);
        let comments = vec![
            comment_on(p.id, author, "first"),
            comment_on(p.id, author, "second"),
        ];

        let paired = attach_comments(vec![p], comments);
        let contents: Vec<_> = paired[0].comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
    }

    #[test]
    fn merged_feed_is_ordered_by_recency() {
        // The student scenario: public P1 (Jan 1), private P2 in the user's
        // group (Jan 2); P3 lives in a foreign group and is never fetched.
        let author = Uuid::new_v4();
        let p1 = post(1, author, at(2024, 1, 1), Visibility::Public);
        let p2 = post(2, author, at(2024, 1, 2), Visibility::Private);

        let merged = merge_feed(attach_comments(vec![p1, p2], Vec::new()));

        let ids: Vec<_> = merged.iter().map(|p| p.post.id).collect();
        assert_eq!(ids, [Uuid::from_u128(2), Uuid::from_u128(1)]);
    }

    #[test]
    fn equal_timestamps_tie_break_on_id_descending() {
        let author = Uuid::new_v4();
        let same = at(2024, 3, 1);
        let a = post(1, author, same, Visibility::Public);
        let b = post(2, author, same, Visibility::Public);

        let merged = merge_feed(attach_comments(vec![a, b], Vec::new()));

        let ids: Vec<_> = merged.iter().map(|p| p.post.id).collect();
        assert_eq!(ids, [Uuid::from_u128(2), Uuid::from_u128(1)]);
    }

    #[test]
    fn duplicate_posts_are_deduplicated_by_id() {
        let author = Uuid::new_v4();
        let p = post(7, author, at(2024, 2, 1), Visibility::Private);

        let merged = merge_feed(attach_comments(vec![p.clone(), p], Vec::new()));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn author_names_are_attached_to_posts_and_comments() {
        let poster = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let p = post(1, poster, at(2024, 1, 1), Visibility::Public);
        let paired = attach_comments(vec![p], vec![comment_on(Uuid::from_u128(1), commenter, "hi")]);

        let usernames: HashMap<Uuid, String> = [
            (poster, "anna".to_string()),
            (commenter, "bela".to_string()),
        ]
        .into();

        let feed = attach_author_names(paired, &usernames).unwrap();
        assert_eq!(feed[0].author, "anna");
        assert_eq!(feed[0].comments[0].author, "bela");
    }

    #[test]
    fn unresolvable_author_is_an_integrity_error() {
        let poster = Uuid::new_v4();
        let p = post(1, poster, at(2024, 1, 1), Visibility::Public);
        let paired = attach_comments(vec![p], Vec::new());

        let err = attach_author_names(paired, &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn collected_author_ids_cover_posts_and_comments() {
        let poster = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let p = post(1, poster, at(2024, 1, 1), Visibility::Public);
        let paired =
            attach_comments(vec![p], vec![comment_on(Uuid::from_u128(1), commenter, "hi")]);

        let ids = collect_author_ids(&paired);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&poster));
        assert!(ids.contains(&commenter));
    }
}
