// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Analytics engine: rolling-window time series and ranked leaderboards for
//! an artist, computed read-only from the raw interaction rows. An artist
//! with no history gets zero-filled series and empty lists.

use std::collections::HashMap;

use chrono::{Duration, Local, TimeZone};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::error::StoreResult;
use crate::models::{now_millis, Product, User};
use crate::schema::{comments, follows, orders, post_likes, posts, products, subscriptions, users};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    /// Calendar day in the local time zone, month-day key ("MM-DD"). Keys can
    /// collide across a year boundary; acceptable while the window stays
    /// short.
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAmount {
    pub day: String,
    /// Sum of order totals for the day, truncated to whole currency units.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopFan {
    pub user: User,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistStats {
    pub follower_growth: Vec<DailyCount>,
    pub engagement_activity: Vec<DailyCount>,
    pub revenue_growth: Vec<DailyAmount>,
    pub total_followers: i64,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub subscription_revenue: f64,
    pub order_revenue: f64,
    pub total_revenue: f64,
    pub total_subscribers: i64,
    pub top_fans: Vec<TopFan>,
    pub top_products: Vec<Product>,
}

fn day_key(millis: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%m-%d").to_string())
}

/// The trailing window as month-day keys, oldest first, today last.
fn window_keys(window_days: u32) -> Vec<String> {
    let today = Local::now().date_naive();
    (0..i64::from(window_days))
        .rev()
        .map(|back| (today - Duration::days(back)).format("%m-%d").to_string())
        .collect()
}

/// Buckets event timestamps into exactly `window_days` daily buckets. The
/// window drives the iteration, not the events, so days without activity are
/// explicit zeros.
fn bucket_daily(timestamps: &[i64], window_days: u32) -> Vec<DailyCount> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for &ts in timestamps {
        if let Some(key) = day_key(ts) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    window_keys(window_days)
        .into_iter()
        .map(|day| DailyCount {
            count: counts.get(&day).copied().unwrap_or(0),
            day,
        })
        .collect()
}

fn bucket_revenue(rows: &[(i64, f64)], window_days: u32) -> Vec<DailyAmount> {
    let mut sums: HashMap<String, f64> = HashMap::new();
    for &(ts, amount) in rows {
        if let Some(key) = day_key(ts) {
            *sums.entry(key).or_insert(0.0) += amount;
        }
    }
    window_keys(window_days)
        .into_iter()
        .map(|day| DailyAmount {
            amount: sums.get(&day).copied().unwrap_or(0.0) as i64,
            day,
        })
        .collect()
}

/// Computes the full stats block for an artist over a trailing window of
/// `window_days` calendar days. Pure read, no side effects.
pub fn compute_stats(
    conn: &mut SqliteConnection,
    artist_id: i32,
    window_days: u32,
) -> StoreResult<ArtistStats> {
    let now = now_millis();

    let follow_times = follows::table
        .filter(follows::artist_id.eq(artist_id))
        .select(follows::created_at)
        .load::<i64>(conn)?;

    // "Own posts": the artist is both wall and author; fan threads on the
    // artist's wall do not count toward the artist's engagement.
    let like_rows = post_likes::table
        .inner_join(posts::table.on(posts::id.eq(post_likes::post_id)))
        .filter(posts::artist_id.eq(artist_id))
        .filter(posts::author_id.eq(artist_id))
        .select((post_likes::user_id, post_likes::created_at))
        .load::<(i32, i64)>(conn)?;
    let comment_rows = comments::table
        .inner_join(posts::table.on(posts::id.eq(comments::post_id)))
        .filter(posts::artist_id.eq(artist_id))
        .filter(posts::author_id.eq(artist_id))
        .select((comments::user_id, comments::created_at))
        .load::<(i32, i64)>(conn)?;

    // Engagement is the union of like and comment events in one series.
    let engagement_times: Vec<i64> = like_rows
        .iter()
        .map(|&(_, ts)| ts)
        .chain(comment_rows.iter().map(|&(_, ts)| ts))
        .collect();

    let order_rows = orders::table
        .filter(orders::artist_id.eq(artist_id))
        .select((orders::created_at, orders::total_amount))
        .load::<(i64, f64)>(conn)?;

    let total_followers = follow_times.len() as i64;
    let total_posts = posts::table
        .filter(posts::artist_id.eq(artist_id))
        .filter(posts::author_id.eq(artist_id))
        .count()
        .get_result::<i64>(conn)?;
    let total_likes = like_rows.len() as i64;
    let total_comments = comment_rows.len() as i64;

    // All-time subscription count priced at the artist's *current* rate, not
    // the rate paid historically.
    let current_price = users::table
        .find(artist_id)
        .select(users::subscription_price)
        .first::<Option<f64>>(conn)
        .optional()?
        .flatten()
        .unwrap_or(0.0);
    let all_time_subscriptions = subscriptions::table
        .filter(subscriptions::artist_id.eq(artist_id))
        .count()
        .get_result::<i64>(conn)?;
    let subscription_revenue = all_time_subscriptions as f64 * current_price;

    let order_revenue: f64 = order_rows.iter().map(|&(_, amount)| amount).sum();

    let total_subscribers = subscriptions::table
        .filter(subscriptions::artist_id.eq(artist_id))
        .filter(subscriptions::is_cancelled.eq(false))
        .filter(subscriptions::valid_until.gt(now))
        .count()
        .get_result::<i64>(conn)?;

    let top_fans = rank_top_fans(conn, artist_id, &like_rows, &comment_rows)?;

    let top_products = products::table
        .filter(products::artist_id.eq(artist_id))
        .order(products::sold_count.desc())
        .limit(5)
        .load::<Product>(conn)?;

    Ok(ArtistStats {
        follower_growth: bucket_daily(&follow_times, window_days),
        engagement_activity: bucket_daily(&engagement_times, window_days),
        revenue_growth: bucket_revenue(&order_rows, window_days),
        total_followers,
        total_posts,
        total_likes,
        total_comments,
        subscription_revenue,
        order_revenue,
        total_revenue: subscription_revenue + order_revenue,
        total_subscribers,
        top_fans,
        top_products,
    })
}

/// Score = likes x1 + comments x2 on the artist's own posts. The artist never
/// appears on their own leaderboard, and a fan id that no longer resolves to
/// a user is dropped silently.
fn rank_top_fans(
    conn: &mut SqliteConnection,
    artist_id: i32,
    like_rows: &[(i32, i64)],
    comment_rows: &[(i32, i64)],
) -> StoreResult<Vec<TopFan>> {
    let mut scores: HashMap<i32, i64> = HashMap::new();
    for &(user_id, _) in like_rows {
        *scores.entry(user_id).or_insert(0) += 1;
    }
    for &(user_id, _) in comment_rows {
        *scores.entry(user_id).or_insert(0) += 2;
    }
    scores.remove(&artist_id);

    let mut ranked: Vec<(i32, i64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(5);

    let ids: Vec<i32> = ranked.iter().map(|&(id, _)| id).collect();
    let profiles: HashMap<i32, User> = users::table
        .filter(users::id.eq_any(&ids))
        .load::<User>(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(ranked
        .into_iter()
        .filter_map(|(id, score)| profiles.get(&id).cloned().map(|user| TopFan { user, score }))
        .collect())
}
