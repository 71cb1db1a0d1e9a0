//! Integration tests for the marketplace store: the checkout transaction,
//! the message-authorization rule, and the projection queries, all against
//! in-memory SQLite.

use std::sync::Arc;
use std::thread;

use quadmart_db::items::ItemInput;
use quadmart_db::{Database, StoreError};
use rust_decimal::Decimal;
use uuid::Uuid;

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn add_user(db: &Database, name: &str) -> String {
    let id = new_id();
    db.create_user(&id, name, &format!("{}@campus.edu", name), "hash", "Engineering")
        .unwrap();
    id
}

fn add_sell_item(db: &Database, owner: &str, title: &str, price: &str) -> String {
    let id = new_id();
    db.create_item(
        &id,
        owner,
        &ItemInput {
            title,
            description: "test listing",
            category: "books",
            image_url: None,
            item_type: "sell",
            price: Some(price),
            expected_exchange: None,
        },
    )
    .unwrap();
    id
}

fn add_barter_item(db: &Database, owner: &str, title: &str) -> String {
    let id = new_id();
    db.create_item(
        &id,
        owner,
        &ItemInput {
            title,
            description: "test listing",
            category: "books",
            image_url: None,
            item_type: "barter",
            price: None,
            expected_exchange: Some("a lamp"),
        },
    )
    .unwrap();
    id
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn count(db: &Database, table: &str) -> i64 {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap())
    })
    .unwrap()
}

// -- checkout --

#[test]
fn checkout_empty_cart_creates_nothing() {
    let db = db();
    let buyer = add_user(&db, "ana");

    let err = db.checkout(&buyer).unwrap_err();
    assert!(matches!(err, StoreError::EmptyCart));
    assert_eq!(count(&db, "orders"), 0);
    assert_eq!(count(&db, "order_items"), 0);
}

#[test]
fn checkout_with_only_invalid_entries_leaves_cart_untouched() {
    let db = db();
    let seller = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let barter = add_barter_item(&db, &seller, "couch");

    db.add_cart_entry(&new_id(), &buyer, &barter).unwrap();

    let err = db.checkout(&buyer).unwrap_err();
    assert!(matches!(err, StoreError::NoSellableItems));

    // Nothing was created and the cart, invalid entries included, remains.
    assert_eq!(count(&db, "orders"), 0);
    assert_eq!(db.list_cart(&buyer).unwrap().len(), 1);
}

#[test]
fn checkout_mixed_cart_sells_only_the_valid_entry() {
    let db = db();
    let seller = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");

    let a = add_sell_item(&db, &seller, "calculus textbook", "15.00");
    let b = add_barter_item(&db, &seller, "couch");
    let c = add_sell_item(&db, &seller, "desk lamp", "10.00");

    // C is already sold: someone else bought it earlier.
    let other = add_user(&db, "kit");
    db.add_cart_entry(&new_id(), &other, &c).unwrap();
    db.checkout(&other).unwrap();

    for item in [&a, &b, &c] {
        db.add_cart_entry(&new_id(), &buyer, item).unwrap();
    }

    let receipt = db.checkout(&buyer).unwrap();

    assert_eq!(receipt.total, dec("15.00"));
    assert_eq!(receipt.lines.len(), 1);
    assert_eq!(receipt.lines[0].item_id, a);
    assert_eq!(receipt.lines[0].price, dec("15.00"));

    // A sold, B still unsold, C untouched; the cart is fully cleared.
    assert!(db.get_item(&a).unwrap().unwrap().is_sold);
    assert!(!db.get_item(&b).unwrap().unwrap().is_sold);
    assert!(db.get_item(&c).unwrap().unwrap().is_sold);
    assert!(db.list_cart(&buyer).unwrap().is_empty());
}

#[test]
fn checkout_total_is_exact_decimal_sum() {
    let db = db();
    let seller = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");

    let x = add_sell_item(&db, &seller, "bike", "10.50");
    let y = add_sell_item(&db, &seller, "helmet", "20.25");
    db.add_cart_entry(&new_id(), &buyer, &x).unwrap();
    db.add_cart_entry(&new_id(), &buyer, &y).unwrap();

    let receipt = db.checkout(&buyer).unwrap();
    assert_eq!(receipt.total, dec("30.75"));

    // The stored text is the same exact decimal, and the line prices sum to
    // the order total with no rounding drift.
    let stored: String = db
        .with_conn(|conn| {
            Ok(conn
                .query_row("SELECT total FROM orders WHERE id = ?1", [&receipt.order_id], |r| {
                    r.get(0)
                })
                .unwrap())
        })
        .unwrap();
    assert_eq!(stored, "30.75");

    let line_sum: Decimal = receipt.lines.iter().map(|l| l.price).sum();
    assert_eq!(line_sum, receipt.total);
}

#[test]
fn checkout_snapshots_price_at_purchase() {
    let db = db();
    let seller = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");

    let item = add_sell_item(&db, &seller, "bike", "99.99");
    db.add_cart_entry(&new_id(), &buyer, &item).unwrap();
    let receipt = db.checkout(&buyer).unwrap();

    let snapshot: String = db
        .with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT price FROM order_items WHERE order_id = ?1",
                    [&receipt.order_id],
                    |r| r.get(0),
                )
                .unwrap())
        })
        .unwrap();
    assert_eq!(snapshot, "99.99");
}

#[test]
fn checkout_dedupes_duplicate_cart_rows() {
    let db = db();
    let seller = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");

    // Add-to-cart does not dedupe, so the same item can sit in the cart
    // twice. It can only be sold once.
    let item = add_sell_item(&db, &seller, "bike", "40.00");
    db.add_cart_entry(&new_id(), &buyer, &item).unwrap();
    db.add_cart_entry(&new_id(), &buyer, &item).unwrap();

    let receipt = db.checkout(&buyer).unwrap();
    assert_eq!(receipt.lines.len(), 1);
    assert_eq!(receipt.total, dec("40.00"));
    assert!(db.list_cart(&buyer).unwrap().is_empty());
}

#[test]
fn second_checkout_of_same_item_excludes_it() {
    let db = db();
    let seller = add_user(&db, "bo");
    let first = add_user(&db, "ana");
    let second = add_user(&db, "kit");

    let item = add_sell_item(&db, &seller, "bike", "40.00");
    db.add_cart_entry(&new_id(), &first, &item).unwrap();
    db.add_cart_entry(&new_id(), &second, &item).unwrap();

    db.checkout(&first).unwrap();

    // The second buyer's only entry is now sold, so their checkout fails
    // and creates nothing.
    let err = db.checkout(&second).unwrap_err();
    assert!(matches!(err, StoreError::NoSellableItems));
    assert_eq!(count(&db, "orders"), 1);
    assert_eq!(count(&db, "order_items"), 1);
}

#[test]
fn concurrent_checkouts_sell_an_item_exactly_once() {
    let db = Arc::new(db());
    let seller = add_user(&db, "bo");
    let first = add_user(&db, "ana");
    let second = add_user(&db, "kit");

    let item = add_sell_item(&db, &seller, "bike", "40.00");
    db.add_cart_entry(&new_id(), &first, &item).unwrap();
    db.add_cart_entry(&new_id(), &second, &item).unwrap();

    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|buyer| {
            let db = Arc::clone(&db);
            thread::spawn(move || db.checkout(&buyer))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let losses = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::NoSellableItems)))
        .count();

    assert_eq!(wins, 1);
    assert_eq!(losses, 1);
    assert_eq!(count(&db, "order_items"), 1);
}

// -- message authorization --

#[test]
fn buyer_may_always_message_the_owner() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    let msg = db
        .send_message(&new_id(), &item, &buyer, &owner, Some("still available?"), None)
        .unwrap();
    assert_eq!(msg.sender_id, buyer);
    assert_eq!(msg.receiver_id, owner);
}

#[test]
fn owner_may_reply_only_after_buyer_contact() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    // Reply before any contact: denied, and no row is created.
    let err = db
        .send_message(&new_id(), &item, &owner, &buyer, Some("interested?"), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));
    assert_eq!(count(&db, "messages"), 0);

    db.send_message(&new_id(), &item, &buyer, &owner, Some("still available?"), None)
        .unwrap();

    // Now the thread exists and the owner may reply.
    db.send_message(&new_id(), &item, &owner, &buyer, Some("it is"), None)
        .unwrap();
    assert_eq!(count(&db, "messages"), 2);
}

#[test]
fn each_buyer_gets_an_independent_thread() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer1 = add_user(&db, "ana");
    let buyer2 = add_user(&db, "kit");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    db.send_message(&new_id(), &item, &buyer1, &owner, Some("hi"), None)
        .unwrap();

    // buyer1's contact does not open the door to buyer2.
    let err = db
        .send_message(&new_id(), &item, &owner, &buyer2, Some("want it?"), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));

    // A second buyer opens their own thread freely.
    db.send_message(&new_id(), &item, &buyer2, &owner, Some("hello"), None)
        .unwrap();
    db.send_message(&new_id(), &item, &owner, &buyer2, Some("want it?"), None)
        .unwrap();
}

#[test]
fn buyers_cannot_message_each_other() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer1 = add_user(&db, "ana");
    let buyer2 = add_user(&db, "kit");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    let err = db
        .send_message(&new_id(), &item, &buyer1, &buyer2, Some("psst"), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));
    assert_eq!(count(&db, "messages"), 0);
}

#[test]
fn contact_is_scoped_per_item() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let bike = add_sell_item(&db, &owner, "bike", "40.00");
    let lamp = add_sell_item(&db, &owner, "lamp", "10.00");

    db.send_message(&new_id(), &bike, &buyer, &owner, Some("hi"), None)
        .unwrap();

    // Contact on the bike does not authorize a reply on the lamp.
    let err = db
        .send_message(&new_id(), &lamp, &owner, &buyer, Some("lamp too?"), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));
}

#[test]
fn messaging_about_a_missing_item_is_not_found() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");

    let err = db
        .send_message(&new_id(), &new_id(), &buyer, &owner, Some("hi"), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound("item")));

    let item = add_sell_item(&db, &owner, "bike", "40.00");
    let err = db
        .send_message(&new_id(), &item, &buyer, &new_id(), Some("hi"), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound("receiver")));
}

#[test]
fn thread_view_is_scoped_to_the_participant() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer1 = add_user(&db, "ana");
    let buyer2 = add_user(&db, "kit");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    db.send_message(&new_id(), &item, &buyer1, &owner, Some("one"), None)
        .unwrap();
    db.send_message(&new_id(), &item, &buyer2, &owner, Some("two"), None)
        .unwrap();
    db.send_message(&new_id(), &item, &owner, &buyer1, Some("three"), None)
        .unwrap();

    // buyer1 sees only their own exchange, oldest first.
    let thread = db.get_item_messages(&item, &buyer1).unwrap();
    let bodies: Vec<_> = thread.iter().map(|m| m.body.as_deref().unwrap()).collect();
    assert_eq!(bodies, ["one", "three"]);

    // The owner sees all three.
    assert_eq!(db.get_item_messages(&item, &owner).unwrap().len(), 3);
}

#[test]
fn inbox_joins_the_listing_and_orders_newest_first() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    db.send_message(&new_id(), &item, &buyer, &owner, Some("first"), None)
        .unwrap();
    db.send_message(&new_id(), &item, &owner, &buyer, Some("second"), None)
        .unwrap();

    let inbox = db.get_user_messages(&buyer).unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].message.body.as_deref(), Some("second"));
    assert_eq!(inbox[0].item_title, "bike");
    assert_eq!(inbox[1].message.sender_name, "ana");
}

// -- items, cart, wishlist --

#[test]
fn only_the_owner_may_update_or_delete_a_listing() {
    let db = db();
    let owner = add_user(&db, "bo");
    let stranger = add_user(&db, "ana");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    let input = ItemInput {
        title: "bike (price drop)",
        description: "test listing",
        category: "sports",
        image_url: None,
        item_type: "sell",
        price: Some("35.00"),
        expected_exchange: None,
    };

    let err = db.update_item(&item, &stranger, &input).unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));

    let err = db.delete_item(&item, &stranger).unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));

    let updated = db.update_item(&item, &owner, &input).unwrap();
    assert_eq!(updated.title, "bike (price drop)");
    assert_eq!(updated.price.as_deref(), Some("35.00"));
}

#[test]
fn deleting_a_listing_cascades_its_dependents() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    db.send_message(&new_id(), &item, &buyer, &owner, Some("hi"), None)
        .unwrap();
    db.add_cart_entry(&new_id(), &buyer, &item).unwrap();
    db.add_wishlist_entry(&new_id(), &buyer, &item).unwrap();

    db.delete_item(&item, &owner).unwrap();

    assert_eq!(count(&db, "messages"), 0);
    assert_eq!(count(&db, "cart_items"), 0);
    assert_eq!(count(&db, "wishlist_items"), 0);
}

#[test]
fn cart_add_requires_an_existing_item() {
    let db = db();
    let buyer = add_user(&db, "ana");

    let err = db.add_cart_entry(&new_id(), &buyer, &new_id()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound("item")));
}

#[test]
fn cart_and_wishlist_are_independent() {
    let db = db();
    let owner = add_user(&db, "bo");
    let buyer = add_user(&db, "ana");
    let item = add_sell_item(&db, &owner, "bike", "40.00");

    db.add_cart_entry(&new_id(), &buyer, &item).unwrap();
    db.add_wishlist_entry(&new_id(), &buyer, &item).unwrap();

    db.remove_cart_entry(&buyer, &item).unwrap();
    assert!(db.list_cart(&buyer).unwrap().is_empty());
    assert_eq!(db.list_wishlist(&buyer).unwrap().len(), 1);
    assert_eq!(db.list_wishlist(&buyer).unwrap()[0].item.title, "bike");
}

#[test]
fn listings_come_back_newest_first_with_owner_attached() {
    let db = db();
    let owner = add_user(&db, "bo");
    add_sell_item(&db, &owner, "first", "1.00");
    add_sell_item(&db, &owner, "second", "2.00");

    let items = db.list_items().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "second");
    assert_eq!(items[0].owner_name, "bo");
    assert_eq!(items[0].owner_college, "Engineering");
}

// -- users --

#[test]
fn external_login_finds_links_and_creates() {
    let db = db();

    // Fresh external identity creates a passwordless account.
    let created = db
        .find_or_create_external_user("ext-1", "ana@campus.edu", "ana", "Engineering")
        .unwrap();
    assert_eq!(created.password, None);
    assert_eq!(created.external_id.as_deref(), Some("ext-1"));

    // Same identity again resolves to the same account.
    let again = db
        .find_or_create_external_user("ext-1", "ana@campus.edu", "ana", "Engineering")
        .unwrap();
    assert_eq!(again.id, created.id);

    // A password account with a matching email gets the identity linked.
    let bo = add_user(&db, "bo");
    let linked = db
        .find_or_create_external_user("ext-2", "bo@campus.edu", "bo", "Engineering")
        .unwrap();
    assert_eq!(linked.id, bo);
    assert_eq!(linked.external_id.as_deref(), Some("ext-2"));
    assert!(linked.password.is_some());
}
