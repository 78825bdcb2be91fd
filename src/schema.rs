// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::allow_tables_to_appear_in_same_query;
use diesel::table;

table! {
    users (id) {
        id -> Integer,
        username -> Text,
        display_name -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        role -> Text,
        status -> Text,
        is_suspended -> Bool,
        suspension_ends_at -> Nullable<BigInt>,
        subscription_price -> Nullable<Double>,
        subscription_duration_days -> Nullable<Integer>,
        benefits -> Nullable<Text>,
        is_fandom_active -> Bool,
        is_dm_active -> Bool,
        is_interaction_enabled -> Bool,
        created_at -> BigInt,
    }
}

table! {
    posts (id) {
        id -> Integer,
        author_id -> Integer,
        artist_id -> Integer,
        content -> Text,
        image_url -> Nullable<Text>,
        is_thread -> Bool,
        created_at -> BigInt,
    }
}

table! {
    comments (id) {
        id -> Integer,
        post_id -> Integer,
        user_id -> Integer,
        parent_id -> Nullable<Integer>,
        content -> Text,
        like_count -> Integer,
        created_at -> BigInt,
    }
}

table! {
    post_likes (id) {
        id -> Integer,
        post_id -> Integer,
        user_id -> Integer,
        created_at -> BigInt,
    }
}

table! {
    comment_likes (id) {
        id -> Integer,
        comment_id -> Integer,
        user_id -> Integer,
        created_at -> BigInt,
    }
}

table! {
    follows (id) {
        id -> Integer,
        follower_id -> Integer,
        artist_id -> Integer,
        created_at -> BigInt,
    }
}

table! {
    saved_posts (id) {
        id -> Integer,
        user_id -> Integer,
        post_id -> Integer,
        created_at -> BigInt,
    }
}

table! {
    blocks (id) {
        id -> Integer,
        blocker_id -> Integer,
        blocked_id -> Integer,
        created_at -> BigInt,
    }
}

table! {
    subscriptions (id) {
        id -> Integer,
        user_id -> Integer,
        artist_id -> Integer,
        start_date -> BigInt,
        valid_until -> BigInt,
        is_cancelled -> Bool,
    }
}

table! {
    products (id) {
        id -> Integer,
        artist_id -> Integer,
        name -> Text,
        description -> Nullable<Text>,
        image_url -> Nullable<Text>,
        price -> Double,
        stock -> Integer,
        sold_count -> Integer,
        rating -> Double,
        created_at -> BigInt,
    }
}

table! {
    cart_items (id) {
        id -> Integer,
        user_id -> Integer,
        product_id -> Integer,
        quantity -> Integer,
        created_at -> BigInt,
    }
}

table! {
    orders (id) {
        id -> Integer,
        user_id -> Integer,
        artist_id -> Integer,
        total_amount -> Double,
        status -> Text,
        shipping_address -> Text,
        payment_method -> Text,
        items_json -> Text,
        created_at -> BigInt,
    }
}

table! {
    notifications (id) {
        id -> Integer,
        user_id -> Integer,
        sender_id -> Integer,
        kind -> Text,
        reference_id -> Integer,
        title -> Text,
        message -> Text,
        is_read -> Bool,
        created_at -> BigInt,
    }
}

table! {
    reports (id) {
        id -> Integer,
        reporter_id -> Integer,
        reported_id -> Nullable<Integer>,
        reference_id -> Nullable<Integer>,
        kind -> Text,
        reason -> Nullable<Text>,
        status -> Text,
        admin_action -> Nullable<Text>,
        created_at -> BigInt,
    }
}

allow_tables_to_appear_in_same_query!(
    users,
    posts,
    comments,
    post_likes,
    comment_likes,
    follows,
    saved_posts,
    blocks,
    subscriptions,
    products,
    cart_items,
    orders,
    notifications,
    reports,
);
