// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Order fulfillment and inventory consistency: cart mutation rules, the
//! two-pass atomic checkout, and sold-count reconciliation on delivery.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{error, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    now_millis, CartItem, NewCartItem, NewOrder, NewProduct, NotificationKind, Order, OrderLine,
    OrderStatus, Product, Role,
};
use crate::notifications;
use crate::schema::{cart_items, follows, orders, products};
use crate::users;

pub fn create_product(
    conn: &mut SqliteConnection,
    artist_id: i32,
    name: &str,
    description: Option<String>,
    image_url: Option<String>,
    price: f64,
    stock: i32,
) -> StoreResult<Product> {
    let artist = users::get_user(conn, artist_id)?
        .ok_or_else(|| StoreError::not_found("user", artist_id))?;
    if artist.role != Role::Artist {
        return Err(StoreError::validation("only artists can list products"));
    }
    if price <= 0.0 {
        return Err(StoreError::validation("product price must be positive"));
    }
    if stock < 0 {
        return Err(StoreError::validation("product stock cannot be negative"));
    }

    let product = diesel::insert_into(products::table)
        .values(&NewProduct {
            artist_id,
            name: name.to_string(),
            description,
            image_url,
            price,
            stock,
            created_at: now_millis(),
        })
        .get_result::<Product>(conn)?;

    let follower_ids = follows::table
        .filter(follows::artist_id.eq(artist_id))
        .select(follows::follower_id)
        .load::<i32>(conn)?;
    for follower_id in follower_ids {
        notifications::push(
            conn,
            follower_id,
            artist_id,
            NotificationKind::Merch,
            product.id,
            "",
            "",
        )?;
    }

    Ok(product)
}

pub fn get_product(conn: &mut SqliteConnection, product_id: i32) -> StoreResult<Option<Product>> {
    let product = products::table
        .find(product_id)
        .first::<Product>(conn)
        .optional()?;
    Ok(product)
}

pub fn products_for_artist(
    conn: &mut SqliteConnection,
    artist_id: i32,
) -> StoreResult<Vec<Product>> {
    let list = products::table
        .filter(products::artist_id.eq(artist_id))
        .order(products::created_at.desc())
        .load::<Product>(conn)?;
    Ok(list)
}

/// The only code path that mutates `sold_count`. Missing products update
/// zero rows, which is the skip-and-continue the reconciliation wants.
pub fn bump_sold_count(
    conn: &mut SqliteConnection,
    product_id: i32,
    quantity: i32,
) -> StoreResult<()> {
    diesel::update(products::table.find(product_id))
        .set(products::sold_count.eq(products::sold_count + quantity))
        .execute(conn)?;
    Ok(())
}

/// Adds to the cart, accumulating quantity on an existing line. The combined
/// quantity is a soft bound against current stock, re-checked at checkout.
pub fn add_to_cart(
    conn: &mut SqliteConnection,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> StoreResult<CartItem> {
    if quantity < 1 {
        return Err(StoreError::validation("cart quantity must be at least 1"));
    }
    let product = get_product(conn, product_id)?
        .ok_or_else(|| StoreError::not_found("product", product_id))?;

    let existing = cart_items::table
        .filter(cart_items::user_id.eq(user_id))
        .filter(cart_items::product_id.eq(product_id))
        .first::<CartItem>(conn)
        .optional()?;
    let existing_qty = existing.as_ref().map_or(0, |item| item.quantity);

    if existing_qty + quantity > product.stock {
        return Err(StoreError::InsufficientStock {
            product: product.name,
        });
    }

    let item = match existing {
        Some(item) => diesel::update(cart_items::table.find(item.id))
            .set(cart_items::quantity.eq(existing_qty + quantity))
            .get_result::<CartItem>(conn)?,
        None => diesel::insert_into(cart_items::table)
            .values(&NewCartItem {
                user_id,
                product_id,
                quantity,
                created_at: now_millis(),
            })
            .get_result::<CartItem>(conn)?,
    };
    Ok(item)
}

/// Replaces a cart line's quantity, bounded by current stock.
pub fn update_cart_item(
    conn: &mut SqliteConnection,
    cart_item_id: i32,
    quantity: i32,
) -> StoreResult<CartItem> {
    if quantity < 1 {
        return Err(StoreError::validation("cart quantity must be at least 1"));
    }
    let item = cart_items::table
        .find(cart_item_id)
        .first::<CartItem>(conn)
        .optional()?
        .ok_or_else(|| StoreError::not_found("cart item", cart_item_id))?;
    let product = get_product(conn, item.product_id)?
        .ok_or_else(|| StoreError::not_found("product", item.product_id))?;

    if quantity > product.stock {
        return Err(StoreError::InsufficientStock {
            product: product.name,
        });
    }

    let updated = diesel::update(cart_items::table.find(item.id))
        .set(cart_items::quantity.eq(quantity))
        .get_result::<CartItem>(conn)?;
    Ok(updated)
}

pub fn remove_cart_item(conn: &mut SqliteConnection, cart_item_id: i32) -> StoreResult<bool> {
    let removed = diesel::delete(cart_items::table.find(cart_item_id)).execute(conn)?;
    Ok(removed > 0)
}

pub fn cart_for_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> StoreResult<Vec<(CartItem, Product)>> {
    let lines = cart_items::table
        .inner_join(products::table.on(products::id.eq(cart_items::product_id)))
        .filter(cart_items::user_id.eq(user_id))
        .select((CartItem::as_select(), Product::as_select()))
        .order(cart_items::created_at.asc())
        .load::<(CartItem, Product)>(conn)?;
    Ok(lines)
}

/// Checks out the user's whole cart, all-or-nothing, inside one immediate
/// transaction so concurrent checkouts against the same product serialize.
///
/// Two passes: first every line is validated against current stock (failing
/// the entire operation, naming the offending product, before anything is
/// written), then stock is decremented, one order per artist is inserted with
/// a frozen line-item snapshot, and the cart is cleared.
pub fn checkout(
    conn: &mut SqliteConnection,
    user_id: i32,
    shipping_address: &str,
    payment_method: &str,
) -> StoreResult<Vec<Order>> {
    conn.immediate_transaction::<_, StoreError, _>(|conn| {
        let lines = cart_for_user(conn, user_id)?;
        if lines.is_empty() {
            return Err(StoreError::validation("cart is empty"));
        }

        // Validation pass: no partial commit on failure.
        for (item, product) in &lines {
            if item.quantity > product.stock {
                return Err(StoreError::InsufficientStock {
                    product: product.name.clone(),
                });
            }
        }

        // Commit pass.
        let now = now_millis();
        let mut per_artist: Vec<(i32, Vec<OrderLine>, f64)> = Vec::new();
        for (item, product) in &lines {
            diesel::update(products::table.find(product.id))
                .set(products::stock.eq(products::stock - item.quantity))
                .execute(conn)?;

            let line = OrderLine {
                product_id: product.id,
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                price: product.price,
                quantity: item.quantity,
            };
            let amount = product.price * f64::from(item.quantity);
            match per_artist
                .iter_mut()
                .find(|(artist, _, _)| *artist == product.artist_id)
            {
                Some((_, artist_lines, total)) => {
                    artist_lines.push(line);
                    *total += amount;
                }
                None => per_artist.push((product.artist_id, vec![line], amount)),
            }
        }

        let mut placed = Vec::with_capacity(per_artist.len());
        for (artist_id, artist_lines, total) in per_artist {
            let items_json = serde_json::to_string(&artist_lines)
                .map_err(|e| StoreError::validation(format!("cart snapshot failed: {e}")))?;
            let order = diesel::insert_into(orders::table)
                .values(&NewOrder {
                    user_id,
                    artist_id,
                    total_amount: total,
                    status: OrderStatus::Pending,
                    shipping_address: shipping_address.to_string(),
                    payment_method: payment_method.to_string(),
                    items_json,
                    created_at: now,
                })
                .get_result::<Order>(conn)?;
            placed.push(order);
        }

        diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
            .execute(conn)?;

        Ok(placed)
    })
}

pub fn get_order(conn: &mut SqliteConnection, order_id: i32) -> StoreResult<Option<Order>> {
    let order = orders::table
        .find(order_id)
        .first::<Order>(conn)
        .optional()?;
    Ok(order)
}

pub fn orders_for_user(conn: &mut SqliteConnection, user_id: i32) -> StoreResult<Vec<Order>> {
    let list = orders::table
        .filter(orders::user_id.eq(user_id))
        .order(orders::created_at.desc())
        .load::<Order>(conn)?;
    Ok(list)
}

/// Moves an order along PENDING -> PROCESSED -> SHIPPED -> DELIVERED. The
/// transition is caller-driven; sold counts are reconciled from the frozen
/// snapshot only on the edge into DELIVERED, so repeating DELIVERED never
/// double-counts.
pub fn set_order_status(
    conn: &mut SqliteConnection,
    order_id: i32,
    status: OrderStatus,
) -> StoreResult<Order> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let order = get_order(conn, order_id)?
            .ok_or_else(|| StoreError::not_found("order", order_id))?;

        if status == OrderStatus::Delivered && order.status != OrderStatus::Delivered {
            reconcile_sold_counts(conn, &order)?;
        }

        let updated = diesel::update(orders::table.find(order.id))
            .set(orders::status.eq(status))
            .get_result::<Order>(conn)?;
        Ok(updated)
    })
}

/// Replays the order's frozen snapshot into `sold_count`. A line whose
/// product no longer exists is skipped; a snapshot that fails to parse is
/// logged and skipped without aborting the status update itself.
fn reconcile_sold_counts(conn: &mut SqliteConnection, order: &Order) -> StoreResult<()> {
    let lines = match order.lines() {
        Ok(lines) => lines,
        Err(e) => {
            error!(order_id = order.id, "malformed line-item snapshot, skipping reconciliation: {e}");
            return Ok(());
        }
    };
    for line in lines {
        if get_product(conn, line.product_id)?.is_none() {
            warn!(
                order_id = order.id,
                product_id = line.product_id,
                "product gone, skipping sold-count line"
            );
            continue;
        }
        bump_sold_count(conn, line.product_id, line.quantity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;

    #[test]
    fn cart_bounds_are_validated_without_mutation() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let product = test_util::product(&mut conn, artist.id, "tee", 25.0, 3);

        let item = add_to_cart(&mut conn, fan.id, product.id, 2).unwrap();
        assert_eq!(item.quantity, 2);

        // existing 2 + 2 > stock 3
        let err = add_to_cart(&mut conn, fan.id, product.id, 2).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { ref product } if product == "tee"));
        let unchanged = cart_for_user(&mut conn, fan.id).unwrap();
        assert_eq!(unchanged[0].0.quantity, 2);

        let item = add_to_cart(&mut conn, fan.id, product.id, 1).unwrap();
        assert_eq!(item.quantity, 3);

        let err = update_cart_item(&mut conn, item.id, 4).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        let ok = update_cart_item(&mut conn, item.id, 1).unwrap();
        assert_eq!(ok.quantity, 1);
    }

    #[test]
    fn checkout_freezes_lines_and_clears_cart() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let product = test_util::product(&mut conn, artist.id, "print", 12.5, 10);

        add_to_cart(&mut conn, fan.id, product.id, 4).unwrap();
        let orders = checkout(&mut conn, fan.id, "1 Fan Street", "card").unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.artist_id, artist.id);
        assert_eq!(order.total_amount, 50.0);
        assert_eq!(order.status, OrderStatus::Pending);

        let lines = order.lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 4);
        assert_eq!(lines[0].price, 12.5);

        assert_eq!(get_product(&mut conn, product.id).unwrap().unwrap().stock, 6);
        assert!(cart_for_user(&mut conn, fan.id).unwrap().is_empty());
    }

    #[test]
    fn failing_line_aborts_the_whole_checkout() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let plenty = test_util::product(&mut conn, artist.id, "plenty", 5.0, 10);
        let scarce = test_util::product(&mut conn, artist.id, "scarce", 5.0, 5);

        add_to_cart(&mut conn, fan.id, plenty.id, 2).unwrap();
        add_to_cart(&mut conn, fan.id, scarce.id, 5).unwrap();
        // Someone else buys out the scarce product after it entered the cart.
        diesel::update(products::table.find(scarce.id))
            .set(products::stock.eq(1))
            .execute(&mut conn)
            .unwrap();

        let err = checkout(&mut conn, fan.id, "addr", "card").unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { ref product } if product == "scarce"));

        // First line untouched, no order inserted, cart intact.
        assert_eq!(get_product(&mut conn, plenty.id).unwrap().unwrap().stock, 10);
        assert!(orders_for_user(&mut conn, fan.id).unwrap().is_empty());
        assert_eq!(cart_for_user(&mut conn, fan.id).unwrap().len(), 2);
    }

    #[test]
    fn mixed_cart_creates_one_order_per_artist() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let painter = test_util::user(&mut conn, "painter", Role::Artist);
        let singer = test_util::user(&mut conn, "singer", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let canvas = test_util::product(&mut conn, painter.id, "canvas", 30.0, 5);
        let album = test_util::product(&mut conn, singer.id, "album", 15.0, 5);

        add_to_cart(&mut conn, fan.id, canvas.id, 1).unwrap();
        add_to_cart(&mut conn, fan.id, album.id, 2).unwrap();
        let mut orders = checkout(&mut conn, fan.id, "addr", "card").unwrap();
        orders.sort_by_key(|o| o.artist_id);

        assert_eq!(orders.len(), 2);
        let painter_order = orders.iter().find(|o| o.artist_id == painter.id).unwrap();
        let singer_order = orders.iter().find(|o| o.artist_id == singer.id).unwrap();
        assert_eq!(painter_order.total_amount, 30.0);
        assert_eq!(singer_order.total_amount, 30.0);
        assert_eq!(singer_order.lines().unwrap()[0].quantity, 2);
    }

    #[test]
    fn delivery_reconciles_sold_count_exactly_once() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let product = test_util::product(&mut conn, artist.id, "pin", 3.0, 10);

        add_to_cart(&mut conn, fan.id, product.id, 4).unwrap();
        let order = checkout(&mut conn, fan.id, "addr", "card").unwrap().remove(0);

        set_order_status(&mut conn, order.id, OrderStatus::Processed).unwrap();
        set_order_status(&mut conn, order.id, OrderStatus::Shipped).unwrap();
        assert_eq!(get_product(&mut conn, product.id).unwrap().unwrap().sold_count, 0);

        set_order_status(&mut conn, order.id, OrderStatus::Delivered).unwrap();
        assert_eq!(get_product(&mut conn, product.id).unwrap().unwrap().sold_count, 4);

        // Redundant DELIVERED must not double-count.
        set_order_status(&mut conn, order.id, OrderStatus::Delivered).unwrap();
        assert_eq!(get_product(&mut conn, product.id).unwrap().unwrap().sold_count, 4);
    }

    #[test_log::test]
    fn reconciliation_skips_deleted_products_and_bad_snapshots() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let keeper = test_util::product(&mut conn, artist.id, "keeper", 3.0, 10);
        let doomed = test_util::product(&mut conn, artist.id, "doomed", 3.0, 10);

        add_to_cart(&mut conn, fan.id, keeper.id, 1).unwrap();
        add_to_cart(&mut conn, fan.id, doomed.id, 2).unwrap();
        let order = checkout(&mut conn, fan.id, "addr", "card").unwrap().remove(0);

        diesel::delete(products::table.find(doomed.id))
            .execute(&mut conn)
            .unwrap();
        let delivered = set_order_status(&mut conn, order.id, OrderStatus::Delivered).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(get_product(&mut conn, keeper.id).unwrap().unwrap().sold_count, 1);

        // A corrupted snapshot skips reconciliation but not the transition.
        add_to_cart(&mut conn, fan.id, keeper.id, 1).unwrap();
        let order2 = checkout(&mut conn, fan.id, "addr", "card").unwrap().remove(0);
        diesel::update(orders::table.find(order2.id))
            .set(orders::items_json.eq("not json"))
            .execute(&mut conn)
            .unwrap();
        let delivered2 = set_order_status(&mut conn, order2.id, OrderStatus::Delivered).unwrap();
        assert_eq!(delivered2.status, OrderStatus::Delivered);
        assert_eq!(get_product(&mut conn, keeper.id).unwrap().unwrap().sold_count, 1);
    }
}
