mod common;

use chrono::Duration;
use common::{cents, Shop};
use rstest::rstest;
use rust_inventory_engine::core::LedgerStore;
use rust_inventory_engine::types::{EngineError, NewItem, NewUser, PurchaseLine, Role};

#[test]
fn test_buying_the_last_copy() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(100), 1);

    assert_eq!(shop.engine.purchase(reader, book).unwrap(), 1);
    assert_eq!(shop.balance(reader), cents(1));
    assert_eq!(shop.stock(book), 0);

    let second = shop.engine.purchase(reader, book);
    assert!(matches!(second, Err(EngineError::InsufficientStock { .. })));
    assert_eq!(shop.balance(reader), cents(1));
    assert_eq!(shop.owned(reader, book), 1);
}

#[test]
fn test_purchase_out_of_stock_leaves_balance() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(5000));
    let book = shop.book("Dune", cents(999), cents(100), 0);

    let result = shop.engine.purchase(reader, book);

    assert!(matches!(result, Err(EngineError::InsufficientStock { .. })));
    assert_eq!(shop.balance(reader), cents(5000));
}

#[test]
fn test_purchase_needs_full_price() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(500));
    let book = shop.book("Dune", cents(999), cents(100), 3);

    let result = shop.engine.purchase(reader, book);

    assert!(matches!(result, Err(EngineError::InsufficientFunds { .. })));
    assert_eq!(shop.stock(book), 3);
    assert_eq!(shop.owned(reader, book), 0);
}

#[test]
fn test_negative_amounts_never_reach_a_balance() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(100));

    let debtor = shop.catalog.register_user(NewUser {
        username: "debtor".to_string(),
        display_name: "debtor".to_string(),
        credential_hash: String::new(),
        balance: cents(-500),
        role: Role::User,
    });
    assert!(matches!(debtor, Err(EngineError::InvalidAmount { .. })));

    // A row written straight into the store skips catalog validation
    let refund = shop
        .ledger
        .transaction(|tx| {
            tx.insert_item(
                None,
                NewItem::new("Refund", "Anon", cents(-1000), cents(-100), 2),
            )
        })
        .unwrap()
        .id;

    assert!(matches!(
        shop.engine.purchase(reader, refund),
        Err(EngineError::InvalidAmount { .. })
    ));
    assert!(matches!(
        shop.engine.borrow(reader, refund, 7),
        Err(EngineError::InvalidAmount { .. })
    ));
    assert_eq!(shop.balance(reader), cents(100));
    assert_eq!(shop.stock(refund), 2);
    assert_eq!(shop.ledger.counts().users, 1);
}

#[test]
fn test_repeat_purchases_accumulate_ownership() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(10_000));
    let book = shop.book("Dune", cents(1000), cents(100), 5);

    shop.engine.purchase(reader, book).unwrap();
    shop.engine
        .batch_purchase(reader, &[PurchaseLine::new(book, 2)])
        .unwrap();

    assert_eq!(shop.owned(reader, book), 3);
    assert_eq!(shop.ledger.counts().ownerships, 1);
}

#[rstest]
#[case::exact_balance(cents(2500), true)]
#[case::one_cent_short(cents(2499), false)]
fn test_batch_total_against_balance(#[case] balance: rust_decimal::Decimal, #[case] succeeds: bool) {
    let shop = Shop::new();
    let reader = shop.user("ada", balance);
    let dune = shop.book("Dune", cents(1000), cents(100), 5);
    let emma = shop.book("Emma", cents(500), cents(50), 5);

    let result = shop.engine.batch_purchase(
        reader,
        &[PurchaseLine::new(dune, 2), PurchaseLine::new(emma, 1)],
    );

    if succeeds {
        result.unwrap();
        assert_eq!(shop.balance(reader), cents(0));
        assert_eq!(shop.stock(dune), 3);
        assert_eq!(shop.stock(emma), 4);
    } else {
        assert!(matches!(result, Err(EngineError::InsufficientFunds { .. })));
        assert_eq!(shop.balance(reader), balance);
        assert_eq!(shop.stock(dune), 5);
        assert_eq!(shop.stock(emma), 5);
    }
}

#[test]
fn test_batch_names_the_short_item() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(100_000));
    let dune = shop.book("Dune", cents(1000), cents(100), 5);
    let emma = shop.book("Emma", cents(500), cents(50), 1);

    let result = shop.engine.batch_purchase(
        reader,
        &[PurchaseLine::new(dune, 1), PurchaseLine::new(emma, 2)],
    );

    match result {
        Err(EngineError::InsufficientStock { item, available, requested }) => {
            assert_eq!(item, emma);
            assert_eq!(available, 1);
            assert_eq!(requested, 2);
        }
        other => panic!("expected insufficient stock, got {:?}", other),
    }
    assert_eq!(shop.stock(dune), 5);
    assert_eq!(shop.owned(reader, dune), 0);
}

#[test]
fn test_batch_line_order_does_not_matter() {
    let forward = Shop::new();
    let backward = Shop::new();
    for shop in [&forward, &backward] {
        shop.user("ada", cents(3000));
        shop.book("Dune", cents(1000), cents(100), 2);
        shop.book("Emma", cents(500), cents(50), 2);
    }
    let items = forward.catalog.list_items().unwrap();
    let (dune, emma) = (items[0].id, items[1].id);
    let ada = forward.ledger.snapshot().users[0].id;

    forward
        .engine
        .batch_purchase(ada, &[PurchaseLine::new(dune, 2), PurchaseLine::new(emma, 2)])
        .unwrap();
    backward
        .engine
        .batch_purchase(ada, &[PurchaseLine::new(emma, 2), PurchaseLine::new(dune, 2)])
        .unwrap();

    assert_eq!(forward.ledger.snapshot(), backward.ledger.snapshot());
}

#[test]
fn test_borrow_then_return_restores_stock() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(150), 2);

    let loan = shop.engine.borrow(reader, book, 14).unwrap();
    assert_eq!(loan.due_at, common::opening_time() + Duration::days(14));
    assert_eq!(shop.stock(book), 1);
    assert_eq!(shop.balance(reader), cents(850));

    let borrowed = shop.engine.list_borrowed(reader).unwrap();
    assert_eq!(borrowed.len(), 1);
    assert_eq!(borrowed[0].due_at, loan.due_at);

    shop.clock.advance(Duration::days(3));
    let closed = shop.engine.give_back(reader, book).unwrap();
    assert_eq!(closed.returned_at, Some(common::opening_time() + Duration::days(3)));
    assert_eq!(shop.stock(book), 2);
    assert_eq!(shop.balance(reader), cents(850));
    assert!(shop.engine.list_borrowed(reader).unwrap().is_empty());

    let again = shop.engine.give_back(reader, book);
    assert!(matches!(again, Err(EngineError::OpenBorrowNotFound { .. })));
    assert_eq!(shop.stock(book), 2);
}

#[test]
fn test_second_open_borrow_is_rejected() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(100), 3);

    shop.engine.borrow(reader, book, 7).unwrap();
    let duplicate = shop.engine.borrow(reader, book, 7);

    assert!(matches!(duplicate, Err(EngineError::BorrowAlreadyOpen { .. })));
    assert_eq!(shop.stock(book), 2);
    assert_eq!(shop.balance(reader), cents(900));

    // After a return the same pair may borrow again, as a new record
    shop.engine.give_back(reader, book).unwrap();
    shop.engine.borrow(reader, book, 7).unwrap();
    assert_eq!(shop.ledger.counts().borrows, 2);
}

#[rstest]
#[case::zero_days(0)]
#[case::beyond_limit(366)]
fn test_borrow_rejects_bad_loan_period(#[case] days: u32) {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(100), 1);

    let result = shop.engine.borrow(reader, book, days);

    assert!(matches!(result, Err(EngineError::InvalidLoanPeriod { .. })));
    assert_eq!(shop.stock(book), 1);
}

#[test]
fn test_add_to_cart_twice_refreshes_one_row() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(100), 1);

    shop.engine.add_to_cart(reader, book).unwrap();
    shop.clock.advance(Duration::minutes(2));
    let refreshed = shop.engine.add_to_cart(reader, book).unwrap();

    assert_eq!(refreshed, common::opening_time() + Duration::minutes(7));
    assert_eq!(shop.ledger.counts().cart_reservations, 1);
    let cart = shop.engine.list_cart(reader).unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].expires_at, Some(refreshed));
    assert_eq!(shop.stock(book), 1);
}

#[test]
fn test_remove_from_cart_is_idempotent() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(100), 1);

    shop.engine.add_to_cart(reader, book).unwrap();
    shop.engine.remove_from_cart(reader, book).unwrap();
    shop.engine.remove_from_cart(reader, book).unwrap();

    assert!(shop.engine.list_cart(reader).unwrap().is_empty());
    assert_eq!(shop.ledger.counts().cart_reservations, 1);

    // Re-adding clears the removal
    shop.engine.add_to_cart(reader, book).unwrap();
    assert_eq!(shop.engine.list_cart(reader).unwrap().len(), 1);
}

#[test]
fn test_checkout_buys_the_active_cart() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(2000));
    let dune = shop.book("Dune", cents(1000), cents(100), 1);
    let emma = shop.book("Emma", cents(500), cents(50), 1);

    shop.engine.add_to_cart(reader, dune).unwrap();
    shop.engine.add_to_cart(reader, emma).unwrap();
    let bought = shop.engine.checkout(reader).unwrap();

    assert_eq!(bought, vec![PurchaseLine::new(dune, 1), PurchaseLine::new(emma, 1)]);
    assert_eq!(shop.balance(reader), cents(500));
    assert!(shop.engine.list_cart(reader).unwrap().is_empty());

    let empty = shop.engine.checkout(reader);
    assert!(matches!(empty, Err(EngineError::EmptyBatch { .. })));
}

#[test]
fn test_unknown_user_and_item_are_not_found() {
    let shop = Shop::new();
    let reader = shop.user("ada", cents(1000));
    let book = shop.book("Dune", cents(999), cents(100), 1);
    let ghost = rust_inventory_engine::types::UserId(99);
    let missing = rust_inventory_engine::types::ItemId(99);

    assert!(shop.engine.purchase(ghost, book).unwrap_err().is_not_found());
    assert!(shop.engine.purchase(reader, missing).unwrap_err().is_not_found());
    assert!(shop.engine.borrow(reader, missing, 3).unwrap_err().is_not_found());
    assert!(shop.engine.add_to_cart(ghost, book).unwrap_err().is_not_found());
    assert!(shop.engine.list_cart(ghost).unwrap_err().is_not_found());
    assert_eq!(shop.stock(book), 1);
}
