//! End-to-end predicate coverage: comparisons, combinators, range,
//! membership, pattern, null, truth, and existence checks.

mod common;

use common::{database, fetch_all, fetch_one, first_column, Invoice, LineItem};
use querion::prelude::*;

#[test]
fn test_not() {
    let db = database();
    let i = EntityRef::<Invoice>::new();
    let id = i.col::<i64>("id");
    let spec = select(&id)
        .from(&i)
        .filter(not(i.col::<i64>("purchaser_id").eq(1000i64)))
        .order_by(id.asc());
    assert_eq!(first_column(&fetch_all(&db, &spec)), vec![Value::BigInt(3)]);
}

#[test]
fn test_and() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let spec = select(li.col::<i64>("id")).from(&li).filter(
        and([
            li.col::<String>("product_name").eq("test1"),
            li.col::<i32>("price").eq(10),
        ])
        .unwrap(),
    );
    let row = fetch_one(&db, &spec);
    assert_eq!(row.get(0), Some(&Value::BigInt(1)));
}

#[test]
fn test_or() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let price = li.col::<i32>("price");
    let spec = select(li.col::<i64>("id"))
        .from(&li)
        .filter(or([price.eq(10), price.eq(20)]).unwrap());
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(1), Value::BigInt(2)]
    );
}

#[test]
fn test_comparison_operators() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let price = li.col::<i32>("price");

    let count_where = |p: Predicate| fetch_all(&db, &select(li.col::<i64>("id")).from(&li).filter(p)).len();

    assert_eq!(count_where(price.eq(30)), 1);
    assert_eq!(count_where(price.ne(30)), 3);
    assert_eq!(count_where(price.lt(30)), 2);
    assert_eq!(count_where(price.le(30)), 3);
    assert_eq!(count_where(price.gt(30)), 1);
    assert_eq!(count_where(price.ge(30)), 2);
}

#[test]
fn test_between() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let spec = select(li.col::<i64>("id"))
        .from(&li)
        .filter(li.col::<i32>("price").between(20, 50));
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(2), Value::BigInt(3), Value::BigInt(4)]
    );
}

#[test]
fn test_in_list() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let spec = select(li.col::<i64>("id"))
        .from(&li)
        .filter(li.col::<String>("product_name").in_list(["test1", "test3"]));
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(1), Value::BigInt(2), Value::BigInt(4)]
    );
}

#[test]
fn test_is_null_and_is_not_null() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let image = li.col::<Option<String>>("product_image");

    let with_image = select(li.col::<i64>("id")).from(&li).filter(image.is_not_null());
    assert_eq!(
        first_column(&fetch_all(&db, &with_image)),
        vec![Value::BigInt(4)]
    );

    let without_image = select(li.col::<i64>("id")).from(&li).filter(image.is_null());
    assert_eq!(fetch_all(&db, &without_image).len(), 3);
}

#[test]
fn test_null_literal_round_trips_through_is_null() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    // A typed null literal behaves as NULL: IS NULL matches every row.
    let spec = select(li.col::<i64>("id"))
        .from(&li)
        .filter(null_lit::<i32>().is_null());
    assert_eq!(fetch_all(&db, &spec).len(), 4);
}

#[test]
fn test_is_true_and_is_false() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let settled = li.col::<bool>("settled");

    let spec = select(li.col::<i64>("id")).from(&li).filter(settled.is_true());
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(1)]
    );

    let spec = select(li.col::<i64>("id")).from(&li).filter(settled.is_false());
    assert_eq!(fetch_all(&db, &spec).len(), 3);
}

#[test]
fn test_like_and_not_like() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let name = li.col::<String>("product_name");

    let spec = select(li.col::<i64>("id")).from(&li).filter(name.like("test%"));
    assert_eq!(fetch_all(&db, &spec).len(), 4);

    let spec = select(li.col::<i64>("id")).from(&li).filter(name.like("%1"));
    assert_eq!(fetch_all(&db, &spec).len(), 2);

    let spec = select(li.col::<i64>("id")).from(&li).filter(name.not_like("%1"));
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(3), Value::BigInt(4)]
    );
}

#[test]
fn test_exists_returns_outer_rows_with_a_correlated_match() {
    let db = database();
    let i = EntityRef::<Invoice>::aliased("i");
    let li = EntityRef::<LineItem>::aliased("li");

    // Invoices having a line item of price >= 30.
    let expensive = select(li.col::<i64>("id")).from(&li).filter(
        li.col::<i64>("invoice_id")
            .eq(&i.col::<i64>("id"))
            .and(li.col::<i32>("price").ge(30)),
    );
    let id = i.col::<i64>("id");
    let spec = select(&id)
        .from(&i)
        .filter(exists(expensive))
        .order_by(id.asc());
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(2), Value::BigInt(3)]
    );
}

#[test]
fn test_not_exists_returns_the_complement() {
    let db = database();
    let i = EntityRef::<Invoice>::aliased("i");
    let li = EntityRef::<LineItem>::aliased("li");

    let expensive = select(li.col::<i64>("id")).from(&li).filter(
        li.col::<i64>("invoice_id")
            .eq(&i.col::<i64>("id"))
            .and(li.col::<i32>("price").ge(30)),
    );
    let spec = select(i.col::<i64>("id")).from(&i).filter(not_exists(expensive));
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(1)]
    );
}

#[test]
fn test_join_restricts_to_matching_pairs() {
    let db = database();
    let i = EntityRef::<Invoice>::aliased("i");
    let li = EntityRef::<LineItem>::aliased("li");

    let spec = select(li.col::<i64>("id"))
        .from(&i)
        .join(&li, li.col::<i64>("invoice_id").eq(&i.col::<i64>("id")))
        .filter(i.col::<i64>("purchaser_id").eq(1000i64));
    assert_eq!(
        first_column(&fetch_all(&db, &spec)),
        vec![Value::BigInt(1), Value::BigInt(2), Value::BigInt(3)]
    );
}

#[test]
fn test_predicates_reused_across_queries() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let cheap = li.col::<i32>("price").lt(30);

    let ids = select(li.col::<i64>("id")).from(&li).filter(cheap.clone());
    let names = select(li.col::<String>("product_name"))
        .from(&li)
        .filter(cheap);

    assert_eq!(fetch_all(&db, &ids).len(), 2);
    assert_eq!(fetch_all(&db, &names).len(), 2);
}
