// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Two checkouts racing for the last unit of stock must serialize on the
//! database write lock; exactly one wins.

use std::thread;

use anyhow::Result;
use fandomhub_store::models::{now_millis, AccountStatus, NewUser, Role};
use fandomhub_store::{shop, users, Database, StoreError};

fn seeded_user(db: &Database, name: &str, role: Role) -> Result<i32> {
    let user = users::create_user(
        &mut *db.conn()?,
        NewUser {
            username: name.to_string(),
            display_name: None,
            avatar_url: None,
            role,
            status: AccountStatus::Active,
            created_at: now_millis(),
        },
    )?;
    Ok(user.id)
}

#[test]
fn concurrent_checkouts_never_oversell() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("store.db");
    let db = Database::open_at(path.to_str().unwrap(), 4)?;

    let artist_id = seeded_user(&db, "artist", Role::Artist)?;
    let product = shop::create_product(
        &mut *db.conn()?,
        artist_id,
        "last copy",
        None,
        None,
        40.0,
        1,
    )?;

    let fan_a = seeded_user(&db, "fan_a", Role::Fan)?;
    let fan_b = seeded_user(&db, "fan_b", Role::Fan)?;
    shop::add_to_cart(&mut *db.conn()?, fan_a, product.id, 1)?;
    shop::add_to_cart(&mut *db.conn()?, fan_b, product.id, 1)?;

    let handles: Vec<_> = [fan_a, fan_b]
        .into_iter()
        .map(|fan| {
            let db = db.clone();
            thread::spawn(move || -> Result<bool, StoreError> {
                let mut conn = db.conn()?;
                match shop::checkout(&mut conn, fan, "1 Fan Street", "card") {
                    Ok(_) => Ok(true),
                    Err(StoreError::InsufficientStock { .. }) => Ok(false),
                    Err(e) => Err(e),
                }
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        let won = handle.join().expect("checkout thread panicked")?;
        if won {
            wins += 1;
        }
    }

    assert_eq!(wins, 1, "exactly one checkout may claim the last unit");
    let product = shop::get_product(&mut *db.conn()?, product.id)?.expect("product still listed");
    assert_eq!(product.stock, 0);
    Ok(())
}
