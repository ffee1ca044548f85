use std::collections::HashMap;

use sql_orm::prelude::*;
use sql_orm::{MysqlDialect, Shape, SqliteDialect, ValueKind};

model! {
    #[derive(Debug, Default, Clone)]
    pub struct Audit {
        pub created_by: String,
        pub created_at: Option<chrono::NaiveDateTime>,
    }
}

model! {
    /// An account row.
    #[derive(Debug, Default)]
    pub struct Account {
        pub id: u64 => "PRIMARY KEY AUTO_INCREMENT",
        pub email: String => "NOT NULL",
        pub score: f64,
        pub ratio: f32,
        pub avatar: Vec<u8>,
        pub joined: chrono::NaiveDateTime,
        pub small: u8,
        @embedded pub audit: Audit,
        pub(crate) internal: i32,
        password_hash: String,
    }
}

model! {
    #[derive(Default)]
    pub struct WithMap {
        pub id: i32,
        pub attributes: HashMap<String, String>,
    }
}

model! {
    #[derive(Default)]
    pub struct WithNested {
        pub id: i32,
        pub audit: Audit,
    }
}

#[test]
fn describe_reports_every_member() {
    let fields = Account::describe();
    assert_eq!(fields.len(), 10);
    let audit = fields.iter().find(|f| f.name == "audit").unwrap();
    assert!(audit.embedded && audit.exported);
    let hidden = fields.iter().find(|f| f.name == "password_hash").unwrap();
    assert!(!hidden.exported);
    let internal = fields.iter().find(|f| f.name == "internal").unwrap();
    assert!(!internal.exported, "only plain pub members are exported");
    assert_eq!(fields[0].tag, Some("PRIMARY KEY AUTO_INCREMENT"));
    assert_eq!(fields[2].tag, None);
}

#[test]
fn parse_skips_embedded_and_private_members() {
    let account = Account::default();
    let schema = Schema::parse(&account, &MysqlDialect::new()).unwrap();
    assert_eq!(schema.name, "Account");
    assert_eq!(
        schema.field_names,
        vec!["id", "email", "score", "ratio", "avatar", "joined", "small"]
    );
    let types: Vec<&str> = schema.fields.iter().map(|f| f.sql_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["BIGINT", "TEXT", "DOUBLE", "FLOAT", "BLOB", "DATETIME", "INT"]
    );
    assert_eq!(schema.get_field("email").unwrap().tag, "NOT NULL");
    assert_eq!(schema.get_field("score").unwrap().tag, "");
    assert!(schema.get_field("audit").is_none());
    assert!(schema.get_field("password_hash").is_none());
}

#[test]
fn unsupported_members_abort_parsing() {
    let dialect = SqliteDialect::new();
    let with_map = WithMap::default();
    let err = Schema::parse(&with_map, &dialect).unwrap_err();
    assert!(matches!(
        err,
        OrmError::UnsupportedType { shape: Shape::Map, .. }
    ));

    let with_nested = WithNested::default();
    let Err(err) = Schema::parse(&with_nested, &dialect) else {
        panic!("a nested model must not map to a column");
    };
    assert_eq!(err.to_string(), "invalid sql type Audit (struct)");
}

#[test]
fn nested_models_are_structs() {
    assert_eq!(
        Audit::value_kind(),
        ValueKind::Unsupported {
            type_name: "Audit",
            shape: Shape::Struct
        }
    );
}

#[test]
fn boxed_and_borrowed_models_match() {
    let dialect = SqliteDialect::new();
    let account = Account::default();
    let account_ref = &account;
    let boxed = Box::new(Account::default());
    let direct = Schema::parse(&account, &dialect).unwrap();
    let by_box = Schema::parse(&boxed, &dialect).unwrap();
    let by_ref = Schema::parse(&account_ref, &dialect).unwrap();
    assert_eq!(direct.name, by_box.name);
    assert_eq!(direct.fields, by_box.fields);
    assert_eq!(direct.fields, by_ref.fields);
}

#[test]
fn snake_case_table_names() {
    let dialect = MysqlDialect::new();
    let audit = Audit::default();
    let schema = Schema::parse(&audit, &dialect)
        .unwrap()
        .with_name(sql_orm::helpers::to_snake_case(Audit::model_name()));
    assert_eq!(
        schema.create_table_sql(&dialect),
        "CREATE TABLE `audit` (`created_by` TEXT, `created_at` DATETIME)"
    );
}
