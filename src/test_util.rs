// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for module tests.

use diesel::sqlite::SqliteConnection;

use crate::db::Database;
use crate::models::{now_millis, AccountStatus, NewUser, Product, Role, User};

pub fn db() -> Database {
    Database::open_in_memory().expect("in-memory database")
}

pub fn user(conn: &mut SqliteConnection, name: &str, role: Role) -> User {
    crate::users::create_user(
        conn,
        NewUser {
            username: name.to_string(),
            display_name: None,
            avatar_url: None,
            role,
            status: AccountStatus::Active,
            created_at: now_millis(),
        },
    )
    .expect("fixture user")
}

/// Artist with monetization configured, ready to accept subscriptions.
pub fn artist(conn: &mut SqliteConnection, name: &str, price: f64, duration_days: i32) -> User {
    let created = user(conn, name, Role::Artist);
    crate::users::set_monetization(conn, created.id, price, duration_days, None)
        .expect("fixture monetization");
    crate::users::get_user(conn, created.id)
        .expect("fixture reload")
        .expect("fixture user exists")
}

pub fn product(
    conn: &mut SqliteConnection,
    artist_id: i32,
    name: &str,
    price: f64,
    stock: i32,
) -> Product {
    crate::shop::create_product(conn, artist_id, name, None, None, price, stock)
        .expect("fixture product")
}
