// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{comment_likes, comments, post_likes, posts, saved_posts};

/// A post on an artist's wall. `author_id` and `artist_id` are independent:
/// a fan authoring on an artist's wall sets `is_thread`, the artist posting
/// on their own wall does not.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub artist_id: i32,
    pub content: String,
    pub image_url: Option<String>,
    pub is_thread: bool,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: i32,
    pub artist_id: i32,
    pub content: String,
    pub image_url: Option<String>,
    pub is_thread: bool,
    pub created_at: i64,
}

/// A comment on a post. `like_count` is a derived counter maintained only by
/// the comment-like toggle; it must equal the matching `comment_likes` row
/// count after every toggle.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub like_count: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = post_likes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PostLike {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_likes)]
pub struct NewPostLike {
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = saved_posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SavedPost {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = saved_posts)]
pub struct NewSavedPost {
    pub user_id: i32,
    pub post_id: i32,
    pub created_at: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comment_likes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentLike {
    pub id: i32,
    pub comment_id: i32,
    pub user_id: i32,
    pub created_at: i64,
}
