//! Update and delete statements, and single-result execution semantics.

mod common;

use common::{database, fetch_all, Invoice, LineItem};
use querion::prelude::*;
use querion::ExecutionErrorKind;

#[test]
fn test_update_with_restriction() {
    let mut db = database();
    let li = EntityRef::<LineItem>::new();

    let spec = update(&li)
        .set("price", lit(100))
        .filter(li.col::<i64>("id").eq(1i64));
    let criteria = CriteriaCompiler::new().compile_update(&spec).unwrap();
    assert_eq!(db.execute_update(&criteria).unwrap(), 1);

    let prices = fetch_all(&db, &select(li.col::<i32>("price")).from(&li));
    assert_eq!(
        prices[0].get(0),
        Some(&Value::Int(100)),
        "only the first row changes"
    );
    assert_eq!(prices[1].get(0), Some(&Value::Int(20)));
}

#[test]
fn test_update_without_restriction_touches_every_row() {
    let mut db = database();
    let li = EntityRef::<LineItem>::new();

    let spec = update(&li).set("settled", lit(true));
    let criteria = CriteriaCompiler::new().compile_update(&spec).unwrap();
    assert_eq!(db.execute_update(&criteria).unwrap(), 4);

    let unsettled = select(li.col::<i64>("id"))
        .from(&li)
        .filter(li.col::<bool>("settled").is_false());
    assert!(fetch_all(&db, &unsettled).is_empty());
}

#[test]
fn test_update_assignment_can_reference_the_row() {
    let mut db = database();
    let li = EntityRef::<LineItem>::new();

    // Copy the product name over the image column for settled rows.
    let spec = update(&li)
        .set("product_image", li.col::<String>("product_name"))
        .filter(li.col::<bool>("settled").is_true());
    let criteria = CriteriaCompiler::new().compile_update(&spec).unwrap();
    assert_eq!(db.execute_update(&criteria).unwrap(), 1);

    let image = select(li.col::<Option<String>>("product_image"))
        .from(&li)
        .filter(li.col::<i64>("id").eq(1i64));
    let rows = fetch_all(&db, &image);
    assert_eq!(rows[0].get(0), Some(&Value::Text("test1".to_string())));
}

#[test]
fn test_update_with_subquery_restriction() {
    let mut db = database();
    let i = EntityRef::<Invoice>::aliased("i");
    let li = EntityRef::<LineItem>::aliased("li");

    // Settle every line item belonging to purchaser 2000.
    let owning_invoice = select(i.col::<i64>("id")).from(&i).filter(
        i.col::<i64>("id")
            .eq(&li.col::<i64>("invoice_id"))
            .and(i.col::<i64>("purchaser_id").eq(2000i64)),
    );
    let spec = update(&li)
        .set("settled", lit(true))
        .filter(exists(owning_invoice));
    let criteria = CriteriaCompiler::new().compile_update(&spec).unwrap();
    assert_eq!(db.execute_update(&criteria).unwrap(), 1);

    let settled = select(li.col::<i64>("id"))
        .from(&li)
        .filter(li.col::<bool>("settled").is_true());
    assert_eq!(fetch_all(&db, &settled).len(), 2);
}

#[test]
fn test_delete_with_restriction() {
    let mut db = database();
    let li = EntityRef::<LineItem>::new();

    let spec = delete(&li).filter(li.col::<i32>("price").lt(15));
    let criteria = CriteriaCompiler::new().compile_delete(&spec).unwrap();
    assert_eq!(db.execute_delete(&criteria).unwrap(), 1);

    let remaining = fetch_all(&db, &select(li.col::<i64>("id")).from(&li));
    assert_eq!(remaining.len(), 3);
}

#[test]
fn test_delete_without_restriction_clears_the_table() {
    let mut db = database();
    let li = EntityRef::<LineItem>::new();

    let criteria = CriteriaCompiler::new()
        .compile_delete(&delete(&li))
        .unwrap();
    assert_eq!(db.execute_delete(&criteria).unwrap(), 4);
    assert!(fetch_all(&db, &select(li.col::<i64>("id")).from(&li)).is_empty());
}

#[test]
fn test_single_result_requires_exactly_one_row() {
    let db = database();
    let li = EntityRef::<LineItem>::new();
    let compiler = CriteriaCompiler::new();

    let none = select(li.col::<i64>("id"))
        .from(&li)
        .filter(li.col::<i32>("price").gt(1000));
    let criteria = compiler.compile_single(&none).unwrap();
    match db.execute_single(&criteria).unwrap_err() {
        Error::Execution(e) => assert_eq!(e.kind, ExecutionErrorKind::NoResult),
        other => panic!("expected execution error, got {other:?}"),
    }

    let many = select(li.col::<i64>("id")).from(&li);
    let criteria = compiler.compile_single(&many).unwrap();
    match db.execute_single(&criteria).unwrap_err() {
        Error::Execution(e) => assert_eq!(e.kind, ExecutionErrorKind::NonUniqueResult),
        other => panic!("expected execution error, got {other:?}"),
    }
}
