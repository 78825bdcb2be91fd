// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! The in-process boundary the presentation layer talks to. Every mutation
//! runs its repository function and then publishes the touched topics so
//! live queries recompute; read accessors come in one-shot and streaming
//! flavors.

use crate::analytics::{self, ArtistStats};
use crate::config::Config;
use crate::db::Database;
use crate::digest::{self, DigestEntry};
use crate::error::StoreResult;
use crate::gating::{self, MessageGate};
use crate::live::{self, ChangeBus, LiveQuery, Topic};
use crate::models::{
    AdminAction, CartItem, Comment, NewUser, Order, OrderStatus, Post, Product, Report, ReportKind,
    Subscription, User,
};
use crate::moderation::{self, ReportOutcome};
use crate::notifications;
use crate::shop;
use crate::social;
use crate::subscriptions;
use crate::users;

#[derive(Clone)]
pub struct Store {
    db: Database,
    bus: ChangeBus,
    default_window_days: u32,
}

impl Store {
    pub fn open(config: &Config) -> StoreResult<Self> {
        Ok(Self {
            db: Database::open(&config.database)?,
            bus: ChangeBus::new(),
            default_window_days: config.stats.default_window_days,
        })
    }

    /// Isolated store for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
            bus: ChangeBus::new(),
            default_window_days: 30,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    fn publish(&self, topics: &[Topic]) {
        for &topic in topics {
            self.bus.publish(topic);
        }
    }

    // ----- users -----

    pub fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let user = users::create_user(&mut *self.db.conn()?, new_user)?;
        self.publish(&[Topic::Users]);
        Ok(user)
    }

    pub fn get_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        users::get_user(&mut *self.db.conn()?, user_id)
    }

    pub fn set_monetization(
        &self,
        artist_id: i32,
        price: f64,
        duration_days: i32,
        benefits: Option<String>,
    ) -> StoreResult<()> {
        users::set_monetization(&mut *self.db.conn()?, artist_id, price, duration_days, benefits)?;
        self.publish(&[Topic::Users]);
        Ok(())
    }

    // ----- social graph and interactions -----

    pub fn follow(&self, follower_id: i32, artist_id: i32) -> StoreResult<bool> {
        let followed = social::follow(&mut *self.db.conn()?, follower_id, artist_id)?;
        if followed {
            self.publish(&[Topic::Follows, Topic::Notifications]);
        }
        Ok(followed)
    }

    pub fn unfollow(&self, follower_id: i32, artist_id: i32) -> StoreResult<bool> {
        let removed = social::unfollow(&mut *self.db.conn()?, follower_id, artist_id)?;
        if removed {
            self.publish(&[Topic::Follows]);
        }
        Ok(removed)
    }

    pub fn is_following(&self, follower_id: i32, artist_id: i32) -> StoreResult<bool> {
        social::is_following(&mut *self.db.conn()?, follower_id, artist_id)
    }

    pub fn create_post(
        &self,
        author_id: i32,
        artist_id: i32,
        content: &str,
        image_url: Option<String>,
    ) -> StoreResult<Post> {
        let post = social::create_post(&mut *self.db.conn()?, author_id, artist_id, content, image_url)?;
        self.publish(&[Topic::Posts, Topic::Notifications]);
        Ok(post)
    }

    pub fn add_comment(
        &self,
        post_id: i32,
        user_id: i32,
        parent_id: Option<i32>,
        content: &str,
    ) -> StoreResult<Comment> {
        let comment = social::add_comment(&mut *self.db.conn()?, post_id, user_id, parent_id, content)?;
        self.publish(&[Topic::Comments, Topic::Notifications]);
        Ok(comment)
    }

    pub fn toggle_post_like(&self, post_id: i32, user_id: i32) -> StoreResult<bool> {
        let liked = social::toggle_post_like(&mut *self.db.conn()?, post_id, user_id)?;
        self.publish(&[Topic::Likes, Topic::Notifications]);
        Ok(liked)
    }

    pub fn toggle_comment_like(&self, comment_id: i32, user_id: i32) -> StoreResult<bool> {
        let liked = social::toggle_comment_like(&mut *self.db.conn()?, comment_id, user_id)?;
        self.publish(&[Topic::Likes, Topic::Comments]);
        Ok(liked)
    }

    pub fn toggle_saved_post(&self, user_id: i32, post_id: i32) -> StoreResult<bool> {
        let saved = social::toggle_saved_post(&mut *self.db.conn()?, user_id, post_id)?;
        self.publish(&[Topic::Posts]);
        Ok(saved)
    }

    // ----- gating -----

    pub fn can_comment(&self, actor_id: i32, artist_id: i32) -> StoreResult<bool> {
        gating::can_comment(&mut *self.db.conn()?, actor_id, artist_id)
    }

    pub fn message_gate(&self, a: i32, b: i32) -> StoreResult<MessageGate> {
        gating::message_gate(&mut *self.db.conn()?, a, b)
    }

    pub fn is_blocked_between(&self, a: i32, b: i32) -> StoreResult<bool> {
        gating::is_blocked_between(&mut *self.db.conn()?, a, b)
    }

    pub fn block_user(&self, blocker_id: i32, blocked_id: i32) -> StoreResult<bool> {
        let blocked = gating::block_user(&mut *self.db.conn()?, blocker_id, blocked_id)?;
        if blocked {
            self.publish(&[Topic::Blocks, Topic::Follows]);
        }
        Ok(blocked)
    }

    pub fn unblock_user(&self, blocker_id: i32, blocked_id: i32) -> StoreResult<bool> {
        let removed = gating::unblock_user(&mut *self.db.conn()?, blocker_id, blocked_id)?;
        if removed {
            self.publish(&[Topic::Blocks]);
        }
        Ok(removed)
    }

    // ----- subscriptions -----

    pub fn subscribe(&self, fan_id: i32, artist_id: i32) -> StoreResult<Subscription> {
        let subscription = subscriptions::subscribe(&mut *self.db.conn()?, fan_id, artist_id)?;
        self.publish(&[Topic::Subscriptions]);
        Ok(subscription)
    }

    pub fn cancel_subscription(&self, fan_id: i32, artist_id: i32) -> StoreResult<bool> {
        let cancelled = subscriptions::cancel(&mut *self.db.conn()?, fan_id, artist_id)?;
        if cancelled {
            self.publish(&[Topic::Subscriptions]);
        }
        Ok(cancelled)
    }

    // ----- moderation -----

    pub fn submit_report(
        &self,
        reporter_id: i32,
        kind: ReportKind,
        reported_id: Option<i32>,
        reference_id: Option<i32>,
        reason: Option<String>,
    ) -> StoreResult<ReportOutcome> {
        let outcome = moderation::submit_report(
            &mut *self.db.conn()?,
            reporter_id,
            kind,
            reported_id,
            reference_id,
            reason,
        )?;
        if matches!(outcome, ReportOutcome::Filed(_)) {
            self.publish(&[Topic::Reports]);
        }
        Ok(outcome)
    }

    pub fn resolve_report(
        &self,
        report_id: i32,
        action: AdminAction,
        suspension_ends_at: Option<i64>,
    ) -> StoreResult<Report> {
        let report =
            moderation::resolve_report(&mut *self.db.conn()?, report_id, action, suspension_ends_at)?;
        self.publish(&[Topic::Reports, Topic::Notifications]);
        match action {
            AdminAction::Suspend => self.publish(&[Topic::Users]),
            AdminAction::Delete => {
                self.publish(&[Topic::Posts, Topic::Comments, Topic::Products])
            }
            AdminAction::Warning => {}
        }
        Ok(report)
    }

    pub fn dismiss_report(&self, report_id: i32) -> StoreResult<Report> {
        let report = moderation::dismiss_report(&mut *self.db.conn()?, report_id)?;
        self.publish(&[Topic::Reports, Topic::Notifications]);
        Ok(report)
    }

    // ----- shop -----

    pub fn create_product(
        &self,
        artist_id: i32,
        name: &str,
        description: Option<String>,
        image_url: Option<String>,
        price: f64,
        stock: i32,
    ) -> StoreResult<Product> {
        let product = shop::create_product(
            &mut *self.db.conn()?,
            artist_id,
            name,
            description,
            image_url,
            price,
            stock,
        )?;
        self.publish(&[Topic::Products, Topic::Notifications]);
        Ok(product)
    }

    pub fn get_product(&self, product_id: i32) -> StoreResult<Option<Product>> {
        shop::get_product(&mut *self.db.conn()?, product_id)
    }

    pub fn add_to_cart(&self, user_id: i32, product_id: i32, quantity: i32) -> StoreResult<CartItem> {
        let item = shop::add_to_cart(&mut *self.db.conn()?, user_id, product_id, quantity)?;
        self.publish(&[Topic::Cart]);
        Ok(item)
    }

    pub fn update_cart_item(&self, cart_item_id: i32, quantity: i32) -> StoreResult<CartItem> {
        let item = shop::update_cart_item(&mut *self.db.conn()?, cart_item_id, quantity)?;
        self.publish(&[Topic::Cart]);
        Ok(item)
    }

    pub fn remove_cart_item(&self, cart_item_id: i32) -> StoreResult<bool> {
        let removed = shop::remove_cart_item(&mut *self.db.conn()?, cart_item_id)?;
        if removed {
            self.publish(&[Topic::Cart]);
        }
        Ok(removed)
    }

    pub fn cart_for_user(&self, user_id: i32) -> StoreResult<Vec<(CartItem, Product)>> {
        shop::cart_for_user(&mut *self.db.conn()?, user_id)
    }

    pub fn checkout(
        &self,
        user_id: i32,
        shipping_address: &str,
        payment_method: &str,
    ) -> StoreResult<Vec<Order>> {
        let orders = shop::checkout(&mut *self.db.conn()?, user_id, shipping_address, payment_method)?;
        self.publish(&[Topic::Orders, Topic::Products, Topic::Cart]);
        Ok(orders)
    }

    pub fn set_order_status(&self, order_id: i32, status: OrderStatus) -> StoreResult<Order> {
        let order = shop::set_order_status(&mut *self.db.conn()?, order_id, status)?;
        self.publish(&[Topic::Orders, Topic::Products]);
        Ok(order)
    }

    pub fn orders_for_user(&self, user_id: i32) -> StoreResult<Vec<Order>> {
        shop::orders_for_user(&mut *self.db.conn()?, user_id)
    }

    // ----- notifications, digest, analytics -----

    pub fn mark_notification_read(&self, notification_id: i32) -> StoreResult<()> {
        notifications::mark_read(&mut *self.db.conn()?, notification_id)?;
        self.publish(&[Topic::Notifications]);
        Ok(())
    }

    pub fn mark_all_notifications_read(&self, recipient_id: i32) -> StoreResult<()> {
        notifications::mark_all_read(&mut *self.db.conn()?, recipient_id)?;
        self.publish(&[Topic::Notifications]);
        Ok(())
    }

    pub fn unread_notification_count(&self, recipient_id: i32) -> StoreResult<i64> {
        notifications::unread_count(&mut *self.db.conn()?, recipient_id)
    }

    pub fn digest(&self, recipient_id: i32) -> StoreResult<Vec<DigestEntry>> {
        digest::build_digest(&mut *self.db.conn()?, recipient_id)
    }

    /// Continuously-updated digest for a recipient. Requires a tokio runtime.
    pub fn digest_stream(&self, recipient_id: i32) -> StoreResult<LiveQuery<Vec<DigestEntry>>> {
        let db = self.db.clone();
        live::watch_query(
            &self.bus,
            vec![Topic::Notifications, Topic::Users],
            move || digest::build_digest(&mut *db.conn()?, recipient_id),
        )
    }

    pub fn artist_stats(&self, artist_id: i32, window_days: Option<u32>) -> StoreResult<ArtistStats> {
        let window = window_days.unwrap_or(self.default_window_days);
        analytics::compute_stats(&mut *self.db.conn()?, artist_id, window)
    }

    /// Continuously-updated stats block. Requires a tokio runtime.
    pub fn stats_stream(
        &self,
        artist_id: i32,
        window_days: Option<u32>,
    ) -> StoreResult<LiveQuery<ArtistStats>> {
        let window = window_days.unwrap_or(self.default_window_days);
        let db = self.db.clone();
        live::watch_query(
            &self.bus,
            vec![
                Topic::Users,
                Topic::Posts,
                Topic::Comments,
                Topic::Likes,
                Topic::Follows,
                Topic::Subscriptions,
                Topic::Products,
                Topic::Orders,
            ],
            move || analytics::compute_stats(&mut *db.conn()?, artist_id, window),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{now_millis, AccountStatus, Role};

    fn new_user(name: &str, role: Role) -> NewUser {
        NewUser {
            username: name.to_string(),
            display_name: None,
            avatar_url: None,
            role,
            status: AccountStatus::Active,
            created_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn digest_stream_recomputes_after_a_like() {
        let store = Store::open_in_memory().unwrap();
        let artist = store.create_user(new_user("artist", Role::Artist)).unwrap();
        let fan = store.create_user(new_user("fan", Role::Fan)).unwrap();
        let post = store.create_post(artist.id, artist.id, "hello", None).unwrap();

        let mut stream = store.digest_stream(artist.id).unwrap();
        assert!(stream.latest().is_empty());

        store.toggle_post_like(post.id, fan.id).unwrap();
        let digest = tokio::time::timeout(std::time::Duration::from_secs(2), stream.next())
            .await
            .expect("stream update within deadline")
            .expect("stream still open");
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].message, "fan liked your post");
    }

    #[tokio::test]
    async fn stats_stream_recomputes_after_a_follow() {
        let store = Store::open_in_memory().unwrap();
        let artist = store.create_user(new_user("artist", Role::Artist)).unwrap();
        let fan = store.create_user(new_user("fan", Role::Fan)).unwrap();

        let mut stream = store.stats_stream(artist.id, Some(7)).unwrap();
        assert_eq!(stream.latest().total_followers, 0);

        store.follow(fan.id, artist.id).unwrap();
        let stats = tokio::time::timeout(std::time::Duration::from_secs(2), stream.next())
            .await
            .expect("stream update within deadline")
            .expect("stream still open");
        assert_eq!(stats.total_followers, 1);
    }
}
