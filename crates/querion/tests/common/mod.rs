//! Shared fixture: three invoices with four line items.
//!
//! Line-item prices are {10, 20, 30, 50} and product names are
//! test1/test1/test2/test3, so the aggregate expectations are
//! max 50, min 10, avg 27.5, sum 110, count 4, count-distinct 3.

#![allow(dead_code)]

use querion::prelude::*;

entity!(pub struct Invoice => "invoice");
entity!(pub struct LineItem => "line_item");

pub fn database() -> Database {
    let mut db = Database::new();

    db.create_table("invoice", &["id", "purchaser_id"]);
    for (id, purchaser_id) in [(1i64, 1000i64), (2, 1000), (3, 2000)] {
        db.insert(
            "invoice",
            vec![Value::BigInt(id), Value::BigInt(purchaser_id)],
        )
        .unwrap();
    }

    db.create_table(
        "line_item",
        &[
            "id",
            "invoice_id",
            "product_name",
            "product_image",
            "price",
            "settled",
        ],
    );
    let items: [(i64, i64, &str, Option<&str>, i32, bool); 4] = [
        (1, 1, "test1", None, 10, true),
        (2, 1, "test1", None, 20, false),
        (3, 2, "test2", None, 30, false),
        (4, 3, "test3", Some("image"), 50, false),
    ];
    for (id, invoice_id, name, image, price, settled) in items {
        db.insert(
            "line_item",
            vec![
                Value::BigInt(id),
                Value::BigInt(invoice_id),
                Value::Text(name.to_string()),
                Value::from(image),
                Value::Int(price),
                Value::Bool(settled),
            ],
        )
        .unwrap();
    }

    db
}

/// Compile a select specification and run it against `db`.
pub fn fetch_all<T>(db: &Database, spec: &SelectSpec<T>) -> Vec<Row> {
    let criteria = CriteriaCompiler::new().compile_list(spec).unwrap();
    db.execute_select(&criteria).unwrap()
}

/// Compile a select specification and run it expecting exactly one row.
pub fn fetch_one<T>(db: &Database, spec: &SelectSpec<T>) -> Row {
    let criteria = CriteriaCompiler::new().compile_single(spec).unwrap();
    db.execute_single(&criteria).unwrap()
}

/// Collect the first column of every result row.
pub fn first_column(rows: &[Row]) -> Vec<Value> {
    rows.iter()
        .map(|r| r.get(0).cloned().unwrap_or(Value::Null))
        .collect()
}
