// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Interaction write paths: follows, posts, comments, likes, saved posts.
//! Each mutation also enqueues the notification rows the digest builder
//! aggregates later. Duplicate edge writes are boolean no-ops, not errors.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    now_millis, Comment, NewComment, NewFollow, NewPost, NewPostLike, NewSavedPost,
    NotificationKind, Post,
};
use crate::notifications;
use crate::schema::{comment_likes, comments, follows, post_likes, posts, saved_posts};

pub fn is_following(
    conn: &mut SqliteConnection,
    follower_id: i32,
    artist_id: i32,
) -> StoreResult<bool> {
    let count = follows::table
        .filter(follows::follower_id.eq(follower_id))
        .filter(follows::artist_id.eq(artist_id))
        .count()
        .get_result::<i64>(conn)?;
    Ok(count > 0)
}

/// Follow an artist. Returns `false` when the edge already exists (repeat
/// follow is a no-op, uniqueness is enforced check-then-insert).
pub fn follow(conn: &mut SqliteConnection, follower_id: i32, artist_id: i32) -> StoreResult<bool> {
    if follower_id == artist_id {
        return Err(StoreError::validation("cannot follow yourself"));
    }
    if is_following(conn, follower_id, artist_id)? {
        return Ok(false);
    }

    diesel::insert_into(follows::table)
        .values(&NewFollow {
            follower_id,
            artist_id,
            created_at: now_millis(),
        })
        .execute(conn)?;
    notifications::push(
        conn,
        artist_id,
        follower_id,
        NotificationKind::Follow,
        artist_id,
        "",
        "",
    )?;
    Ok(true)
}

pub fn unfollow(conn: &mut SqliteConnection, follower_id: i32, artist_id: i32) -> StoreResult<bool> {
    let removed = diesel::delete(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::artist_id.eq(artist_id)),
    )
    .execute(conn)?;
    Ok(removed > 0)
}

/// Creates a post on an artist's wall. A fan authoring on someone else's wall
/// is a thread; the artist posting on their own wall fans out a POST
/// notification to every follower.
pub fn create_post(
    conn: &mut SqliteConnection,
    author_id: i32,
    artist_id: i32,
    content: &str,
    image_url: Option<String>,
) -> StoreResult<Post> {
    if content.trim().is_empty() {
        return Err(StoreError::validation("post content cannot be empty"));
    }

    let is_thread = author_id != artist_id;
    let post = diesel::insert_into(posts::table)
        .values(&NewPost {
            author_id,
            artist_id,
            content: content.to_string(),
            image_url,
            is_thread,
            created_at: now_millis(),
        })
        .get_result::<Post>(conn)?;

    if !is_thread {
        let follower_ids = follows::table
            .filter(follows::artist_id.eq(artist_id))
            .select(follows::follower_id)
            .load::<i32>(conn)?;
        for follower_id in follower_ids {
            notifications::push(
                conn,
                follower_id,
                author_id,
                NotificationKind::Post,
                post.id,
                "",
                "",
            )?;
        }
    }

    Ok(post)
}

/// Adds a comment, or a one-level-deep reply when `parent_id` is given. The
/// parent must be a top-level comment on the same post.
pub fn add_comment(
    conn: &mut SqliteConnection,
    post_id: i32,
    user_id: i32,
    parent_id: Option<i32>,
    content: &str,
) -> StoreResult<Comment> {
    if content.trim().is_empty() {
        return Err(StoreError::validation("comment content cannot be empty"));
    }
    let post = posts::table
        .find(post_id)
        .first::<Post>(conn)
        .optional()?
        .ok_or_else(|| StoreError::not_found("post", post_id))?;

    let parent = match parent_id {
        Some(pid) => {
            let parent = comments::table
                .find(pid)
                .first::<Comment>(conn)
                .optional()?
                .ok_or_else(|| StoreError::not_found("comment", pid))?;
            if parent.post_id != post_id {
                return Err(StoreError::validation(
                    "reply parent belongs to a different post",
                ));
            }
            if parent.parent_id.is_some() {
                return Err(StoreError::validation("replies are one level deep"));
            }
            Some(parent)
        }
        None => None,
    };

    let comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            post_id,
            user_id,
            parent_id,
            content: content.to_string(),
            created_at: now_millis(),
        })
        .get_result::<Comment>(conn)?;

    match parent {
        Some(parent) if parent.user_id != user_id => {
            notifications::push(
                conn,
                parent.user_id,
                user_id,
                NotificationKind::Reply,
                parent.id,
                "",
                "",
            )?;
        }
        None if post.author_id != user_id => {
            notifications::push(
                conn,
                post.author_id,
                user_id,
                NotificationKind::Comment,
                post.id,
                "",
                "",
            )?;
        }
        _ => {}
    }

    Ok(comment)
}

/// Like/unlike a post. Returns whether the post is liked afterwards.
pub fn toggle_post_like(
    conn: &mut SqliteConnection,
    post_id: i32,
    user_id: i32,
) -> StoreResult<bool> {
    let post = posts::table
        .find(post_id)
        .first::<Post>(conn)
        .optional()?
        .ok_or_else(|| StoreError::not_found("post", post_id))?;

    let existing = post_likes::table
        .filter(post_likes::post_id.eq(post_id))
        .filter(post_likes::user_id.eq(user_id))
        .select(post_likes::id)
        .first::<i32>(conn)
        .optional()?;

    match existing {
        Some(like_id) => {
            diesel::delete(post_likes::table.find(like_id)).execute(conn)?;
            Ok(false)
        }
        None => {
            diesel::insert_into(post_likes::table)
                .values(&NewPostLike {
                    post_id,
                    user_id,
                    created_at: now_millis(),
                })
                .execute(conn)?;
            if post.author_id != user_id {
                notifications::push(
                    conn,
                    post.author_id,
                    user_id,
                    NotificationKind::LikePost,
                    post.id,
                    "",
                    "",
                )?;
            }
            Ok(true)
        }
    }
}

/// Like/unlike a comment, keeping the denormalized `like_count` in step with
/// the `comment_likes` rows inside one transaction. This is the only code
/// path that mutates the counter.
pub fn toggle_comment_like(
    conn: &mut SqliteConnection,
    comment_id: i32,
    user_id: i32,
) -> StoreResult<bool> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let exists = comments::table
            .find(comment_id)
            .select(comments::id)
            .first::<i32>(conn)
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::not_found("comment", comment_id));
        }

        let existing = comment_likes::table
            .filter(comment_likes::comment_id.eq(comment_id))
            .filter(comment_likes::user_id.eq(user_id))
            .select(comment_likes::id)
            .first::<i32>(conn)
            .optional()?;

        match existing {
            Some(like_id) => {
                diesel::delete(comment_likes::table.find(like_id)).execute(conn)?;
                bump_comment_like_count(conn, comment_id, -1)?;
                Ok(false)
            }
            None => {
                diesel::insert_into(comment_likes::table)
                    .values((
                        comment_likes::comment_id.eq(comment_id),
                        comment_likes::user_id.eq(user_id),
                        comment_likes::created_at.eq(now_millis()),
                    ))
                    .execute(conn)?;
                bump_comment_like_count(conn, comment_id, 1)?;
                Ok(true)
            }
        }
    })
}

fn bump_comment_like_count(
    conn: &mut SqliteConnection,
    comment_id: i32,
    delta: i32,
) -> StoreResult<()> {
    diesel::update(comments::table.find(comment_id))
        .set(comments::like_count.eq(comments::like_count + delta))
        .execute(conn)?;
    Ok(())
}

/// Save/unsave a post for later. Returns whether it is saved afterwards.
pub fn toggle_saved_post(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
) -> StoreResult<bool> {
    let existing = saved_posts::table
        .filter(saved_posts::user_id.eq(user_id))
        .filter(saved_posts::post_id.eq(post_id))
        .select(saved_posts::id)
        .first::<i32>(conn)
        .optional()?;

    match existing {
        Some(saved_id) => {
            diesel::delete(saved_posts::table.find(saved_id)).execute(conn)?;
            Ok(false)
        }
        None => {
            diesel::insert_into(saved_posts::table)
                .values(&NewSavedPost {
                    user_id,
                    post_id,
                    created_at: now_millis(),
                })
                .execute(conn)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::test_util;

    fn comment_like_rows(conn: &mut SqliteConnection, comment_id: i32) -> i64 {
        comment_likes::table
            .filter(comment_likes::comment_id.eq(comment_id))
            .count()
            .get_result(conn)
            .unwrap()
    }

    fn like_count(conn: &mut SqliteConnection, comment_id: i32) -> i32 {
        comments::table
            .find(comment_id)
            .select(comments::like_count)
            .first(conn)
            .unwrap()
    }

    #[test]
    fn repeat_follow_is_a_noop() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let artist = test_util::user(&mut conn, "artist", Role::Artist);

        assert!(follow(&mut conn, fan.id, artist.id).unwrap());
        assert!(!follow(&mut conn, fan.id, artist.id).unwrap());
        assert!(is_following(&mut conn, fan.id, artist.id).unwrap());

        assert!(unfollow(&mut conn, fan.id, artist.id).unwrap());
        assert!(!unfollow(&mut conn, fan.id, artist.id).unwrap());
    }

    #[test]
    fn comment_like_count_matches_rows_after_toggles() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let a = test_util::user(&mut conn, "a", Role::Fan);
        let b = test_util::user(&mut conn, "b", Role::Fan);
        let post = create_post(&mut conn, artist.id, artist.id, "hello", None).unwrap();
        let comment = add_comment(&mut conn, post.id, a.id, None, "first").unwrap();

        assert!(toggle_comment_like(&mut conn, comment.id, a.id).unwrap());
        assert!(toggle_comment_like(&mut conn, comment.id, b.id).unwrap());
        assert!(!toggle_comment_like(&mut conn, comment.id, a.id).unwrap());
        assert!(toggle_comment_like(&mut conn, comment.id, a.id).unwrap());

        assert_eq!(like_count(&mut conn, comment.id), 2);
        assert_eq!(
            like_count(&mut conn, comment.id) as i64,
            comment_like_rows(&mut conn, comment.id)
        );
    }

    #[test]
    fn reply_parent_must_be_top_level_and_same_post() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let post = create_post(&mut conn, artist.id, artist.id, "one", None).unwrap();
        let other = create_post(&mut conn, artist.id, artist.id, "two", None).unwrap();
        let top = add_comment(&mut conn, post.id, fan.id, None, "top").unwrap();
        let reply = add_comment(&mut conn, post.id, artist.id, Some(top.id), "reply").unwrap();
        assert_eq!(reply.parent_id, Some(top.id));

        let wrong_post = add_comment(&mut conn, other.id, fan.id, Some(top.id), "x").unwrap_err();
        assert!(matches!(wrong_post, StoreError::Validation(_)));

        let too_deep = add_comment(&mut conn, post.id, fan.id, Some(reply.id), "y").unwrap_err();
        assert!(matches!(too_deep, StoreError::Validation(_)));
    }

    #[test]
    fn fan_post_on_artist_wall_is_a_thread() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);

        let thread = create_post(&mut conn, fan.id, artist.id, "hi", None).unwrap();
        assert!(thread.is_thread);
        let own = create_post(&mut conn, artist.id, artist.id, "hello", None).unwrap();
        assert!(!own.is_thread);
    }

    #[test]
    fn self_like_does_not_notify() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let post = create_post(&mut conn, artist.id, artist.id, "post", None).unwrap();

        assert!(toggle_post_like(&mut conn, post.id, artist.id).unwrap());
        assert_eq!(
            crate::notifications::unread_count(&mut conn, artist.id).unwrap(),
            0
        );
    }
}
