// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::text_enum;
use crate::schema::{cart_items, orders, products};

text_enum! {
    /// Order lifecycle: PENDING -> PROCESSED -> SHIPPED -> DELIVERED.
    OrderStatus {
        Pending => "PENDING",
        Processed => "PROCESSED",
        Shipped => "SHIPPED",
        Delivered => "DELIVERED",
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Product {
    pub id: i32,
    pub artist_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub sold_count: i32,
    pub rating: f64,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub artist_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub created_at: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CartItem {
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem {
    pub user_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub created_at: i64,
}

/// One line of an order's frozen snapshot: the product as it was at checkout
/// time. The snapshot, not the live product row, is the source of truth for
/// delivery reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub artist_id: i32,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub items_json: String,
    pub created_at: i64,
}

impl Order {
    /// Parses the frozen line-item snapshot. A malformed snapshot is a data
    /// inconsistency handled by the caller, not a panic.
    pub fn lines(&self) -> Result<Vec<OrderLine>, serde_json::Error> {
        serde_json::from_str(&self.items_json)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub user_id: i32,
    pub artist_id: i32,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub items_json: String,
    pub created_at: i64,
}
