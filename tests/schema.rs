//! Schema engine coverage: create-table DDL per dialect, alter diffing
//! against mock introspection, command callbacks and batch semantics.

mod common;

use common::{MockExecutor, row};
use pretty_assertions::assert_eq;
use quern::Value;
use quern::schema::{
    Command, CommandKind, MysqlSchema, PostgresSchema, SchemaBuilder, SqliteSchema,
};
use std::sync::{Arc, Mutex};

fn mysql_builder(executor: Arc<MockExecutor>) -> SchemaBuilder {
    SchemaBuilder::new(Arc::new(MysqlSchema), executor)
}

/// The introspection responses for a mysql table with columns `id`
/// (auto-increment pk) and `vote`.
fn push_mysql_table(executor: &MockExecutor) {
    executor.push_rows(vec![
        row(&[
            ("column_name", Value::Text("id".into())),
            ("column_type", Value::Text("bigint unsigned".into())),
            ("is_nullable", Value::Text("NO".into())),
            ("column_default", Value::Null),
            ("extra", Value::Text("auto_increment".into())),
            ("column_comment", Value::Text("".into())),
            ("character_set_name", Value::Null),
            ("collation_name", Value::Null),
        ]),
        row(&[
            ("column_name", Value::Text("vote".into())),
            ("column_type", Value::Text("int".into())),
            ("is_nullable", Value::Text("NO".into())),
            ("column_default", Value::Null),
            ("extra", Value::Text("".into())),
            ("column_comment", Value::Text("".into())),
            ("character_set_name", Value::Null),
            ("collation_name", Value::Null),
        ]),
    ]);
    executor.push_rows(vec![row(&[
        ("index_name", Value::Text("PRIMARY".into())),
        ("non_unique", Value::Int(0)),
        ("column_name", Value::Text("id".into())),
        ("index_type", Value::Text("BTREE".into())),
    ])]);
}

#[test]
fn test_mysql_create_table_ddl() {
    let executor = Arc::new(MockExecutor::new());
    let builder = mysql_builder(executor.clone());
    builder
        .create_table("users", |table| {
            table.id("id");
            table.string("email", 255).unique();
            table.integer("vote").default_(0);
            table.float("score", 5, 2).index();
            table
                .enumeration("status", ["WAITING", "PENDING", "DONE"])
                .set_default("WAITING");
            table.timestamps();
            table.soft_deletes();
        })
        .unwrap();

    assert_eq!(
        executor.statements(),
        vec![
            "create table `users` (\
             `id` bigint unsigned not null auto_increment, \
             `email` varchar(255) not null, \
             `vote` int not null default 0, \
             `score` float(5,2) not null, \
             `status` enum('WAITING','PENDING','DONE') not null default 'WAITING', \
             `created_at` timestamp null, \
             `updated_at` timestamp null, \
             `deleted_at` timestamp null, \
             primary key (`id`), \
             unique key `users_email_unique` (`email`), \
             key `users_score_index` (`score`))"
                .to_owned()
        ]
    );
}

#[test]
fn test_postgres_create_table_uses_serial_and_standalone_indexes() {
    let executor = Arc::new(MockExecutor::new());
    let builder = SchemaBuilder::new(Arc::new(PostgresSchema), executor.clone());
    builder
        .create_table("users", |table| {
            table.id("id");
            table.string("email", 255).unique();
        })
        .unwrap();

    assert_eq!(
        executor.statements(),
        vec![
            r#"create table "public"."users" ("id" bigserial not null, "email" varchar(255) not null, primary key ("id"))"#.to_owned(),
            r#"create unique index "users_email_unique" on "public"."users" ("email")"#.to_owned(),
        ]
    );
}

#[test]
fn test_sqlite_create_table_inlines_autoincrement_primary() {
    let executor = Arc::new(MockExecutor::new());
    let builder = SchemaBuilder::new(Arc::new(SqliteSchema), executor.clone());
    builder
        .create_table("users", |table| {
            table.id("id");
            table.string("email", 255);
        })
        .unwrap();

    assert_eq!(
        executor.statements(),
        vec![
            "create table `users` (`id` integer not null primary key autoincrement, `email` varchar(255) not null)"
                .to_owned()
        ]
    );
}

#[test]
fn test_create_table_failure_runs_callbacks_in_reverse() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let executor = Arc::new(MockExecutor::new());
    executor.fail_on("create table");

    let builder = mysql_builder(executor);
    let (first, second) = (log.clone(), log.clone());
    let result = builder.create_table("users", move |table| {
        table.integer("vote");
        table.add_command(
            Command::new(CommandKind::AddColumn("vote".into()))
                .on_failure(move || first.lock().unwrap().push("first")),
        );
        table.add_command(
            Command::new(CommandKind::CreateIndex("users_vote_index".into()))
                .on_failure(move || second.lock().unwrap().push("second")),
        );
    });

    assert!(result.is_err());
    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
}

#[test]
fn test_alter_adds_only_missing_columns() {
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);

    let builder = mysql_builder(executor.clone());
    builder
        .alter_table("users", |table| {
            table.integer("vote");
            table.string("nick", 50).nullable();
        })
        .unwrap();

    let ddl: Vec<String> = executor
        .statements()
        .into_iter()
        .filter(|sql| sql.starts_with("alter"))
        .collect();
    assert_eq!(
        ddl,
        vec!["alter table `users` add column `nick` varchar(50) null".to_owned()]
    );
}

#[test]
fn test_empty_alter_issues_no_ddl() {
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);

    let builder = mysql_builder(executor.clone());
    builder
        .alter_table("users", |table| {
            table.integer("vote");
        })
        .unwrap();

    assert!(
        !executor
            .statements()
            .iter()
            .any(|sql| sql.starts_with("alter")),
        "an alter with no effective change must issue no DDL"
    );
}

#[test]
fn test_alter_modify_with_change_mark() {
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);

    let builder = mysql_builder(executor.clone());
    builder
        .alter_table("users", |table| {
            table.string("vote", 20).nullable().change();
        })
        .unwrap();

    let ddl: Vec<String> = executor
        .statements()
        .into_iter()
        .filter(|sql| sql.starts_with("alter"))
        .collect();
    assert_eq!(
        ddl,
        vec!["alter table `users` modify `vote` varchar(20) null".to_owned()]
    );
}

#[test]
fn test_alter_command_order() {
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);

    let builder = mysql_builder(executor.clone());
    builder
        .alter_table("users", |table| {
            table.rename_column("vote", "votes");
            table.string("nick", 50);
            table.drop_column("id");
        })
        .unwrap();

    let ddl: Vec<String> = executor
        .statements()
        .into_iter()
        .filter(|sql| sql.starts_with("alter"))
        .collect();
    assert_eq!(
        ddl,
        vec![
            "alter table `users` drop column `id`".to_owned(),
            "alter table `users` add column `nick` varchar(50) not null".to_owned(),
            "alter table `users` rename column `vote` to `votes`".to_owned(),
        ]
    );
}

#[test]
fn test_stale_commands_skip_as_success() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);

    let builder = mysql_builder(executor.clone());
    let ok = log.clone();
    builder
        .alter_table("users", move |table| {
            // dropping a column that is already gone counts as success
            table.add_command(
                Command::new(CommandKind::DropColumn("ghost".into()))
                    .on_success(move || ok.lock().unwrap().push("success")),
            );
        })
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["success"]);
    assert!(
        !executor.statements().iter().any(|sql| sql.contains("ghost")),
        "stale commands must not reach the executor"
    );
}

#[test]
fn test_cancelled_batch_fails_remaining_commands() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);
    executor.cancel_on("drop column `vote`");

    let builder = mysql_builder(executor.clone());
    let (first, second) = (log.clone(), log.clone());
    let result = builder.alter_table("users", move |table| {
        table.add_command(
            Command::new(CommandKind::DropColumn("vote".into()))
                .on_failure(move || first.lock().unwrap().push("first")),
        );
        table.add_command(
            Command::new(CommandKind::DropColumn("id".into()))
                .on_failure(move || second.lock().unwrap().push("second")),
        );
    });

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    // the second drop never reached the executor
    assert!(
        !executor
            .statements()
            .iter()
            .any(|sql| sql.contains("drop column `id`"))
    );
}

#[test]
fn test_drop_primary_uses_introspected_constraint_name() {
    // the live constraint is named by whoever created it, not by any
    // naming convention the blueprint could guess
    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![row(&[
        ("column_name", Value::Text("id".into())),
        ("data_type", Value::Text("bigint".into())),
        ("is_nullable", Value::Text("NO".into())),
        ("column_default", Value::Null),
    ])]);
    executor.push_rows(vec![row(&[
        ("column_name", Value::Text("id".into())),
        ("constraint_name", Value::Text("users_pk_custom".into())),
    ])]);

    let builder = SchemaBuilder::new(Arc::new(PostgresSchema), executor.clone());
    builder
        .alter_table("users", |table| {
            table.drop_primary();
        })
        .unwrap();

    let ddl: Vec<String> = executor
        .statements()
        .into_iter()
        .filter(|sql| sql.starts_with("alter"))
        .collect();
    assert_eq!(
        ddl,
        vec![r#"alter table "public"."users" drop constraint "users_pk_custom""#.to_owned()]
    );
}

#[test]
fn test_drop_primary_on_mysql_needs_no_name() {
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);

    let builder = mysql_builder(executor.clone());
    builder
        .alter_table("users", |table| {
            table.drop_primary();
        })
        .unwrap();

    let ddl: Vec<String> = executor
        .statements()
        .into_iter()
        .filter(|sql| sql.starts_with("alter"))
        .collect();
    assert_eq!(ddl, vec!["alter table `users` drop primary key".to_owned()]);
}

#[test]
fn test_has_table_and_drop_helpers() {
    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![row(&[("table_name", Value::Text("users".into()))])]);
    let builder = mysql_builder(executor.clone());

    assert!(builder.has_table("users").unwrap());
    builder.drop_table_if_exists("users").unwrap();
    builder.rename_table("users", "members").unwrap();

    let statements = executor.statements();
    assert!(statements[0].contains("information_schema.tables"));
    assert_eq!(statements[1], "drop table if exists `users`");
    assert_eq!(statements[2], "alter table `users` rename to `members`");
}

#[test]
fn test_get_column_listing() {
    let executor = Arc::new(MockExecutor::new());
    push_mysql_table(&executor);
    let builder = mysql_builder(executor);
    assert_eq!(builder.get_column_listing("users").unwrap(), vec!["id", "vote"]);
}

#[test]
fn test_create_then_introspect_round_trips_structurally() {
    // introspection rows describing exactly what the create in
    // test_mysql_create_table_ddl would produce for the key columns
    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![
        row(&[
            ("column_name", Value::Text("id".into())),
            ("column_type", Value::Text("bigint unsigned".into())),
            ("is_nullable", Value::Text("NO".into())),
            ("column_default", Value::Null),
            ("extra", Value::Text("auto_increment".into())),
            ("column_comment", Value::Text("".into())),
            ("character_set_name", Value::Null),
            ("collation_name", Value::Null),
        ]),
        row(&[
            ("column_name", Value::Text("email".into())),
            ("column_type", Value::Text("varchar(255)".into())),
            ("is_nullable", Value::Text("NO".into())),
            ("column_default", Value::Null),
            ("extra", Value::Text("".into())),
            ("column_comment", Value::Text("".into())),
            ("character_set_name", Value::Null),
            ("collation_name", Value::Null),
        ]),
        row(&[
            ("column_name", Value::Text("status".into())),
            (
                "column_type",
                Value::Text("enum('WAITING','PENDING','DONE')".into()),
            ),
            ("is_nullable", Value::Text("NO".into())),
            ("column_default", Value::Text("WAITING".into())),
            ("extra", Value::Text("".into())),
            ("column_comment", Value::Text("".into())),
            ("character_set_name", Value::Null),
            ("collation_name", Value::Null),
        ]),
    ]);
    executor.push_rows(vec![
        row(&[
            ("index_name", Value::Text("PRIMARY".into())),
            ("non_unique", Value::Int(0)),
            ("column_name", Value::Text("id".into())),
            ("index_type", Value::Text("BTREE".into())),
        ]),
        row(&[
            ("index_name", Value::Text("users_email_unique".into())),
            ("non_unique", Value::Int(0)),
            ("column_name", Value::Text("email".into())),
            ("index_type", Value::Text("BTREE".into())),
        ]),
    ]);

    let builder = mysql_builder(executor);
    let table = builder.get_table("users").unwrap();

    use quern::schema::{ColumnType, IndexType};
    assert_eq!(table.column_listing(), vec!["id", "email", "status"]);

    let id = table.get_column("id").unwrap();
    assert_eq!(id.column_type, ColumnType::BigInteger);
    assert!(id.unsigned);
    assert!(id.auto_increments());

    let email = table.get_column("email").unwrap();
    assert_eq!(email.column_type, ColumnType::String);
    assert_eq!(email.length, Some(255));

    let status = table.get_column("status").unwrap();
    assert_eq!(status.column_type, ColumnType::Enum);
    assert_eq!(status.options, vec!["WAITING", "PENDING", "DONE"]);
    assert_eq!(status.default, Some(Value::Text("WAITING".into())));

    let unique = table.get_index("users_email_unique").unwrap();
    assert_eq!(unique.index_type, IndexType::Unique);
    assert_eq!(unique.columns, vec!["email"]);
    assert_eq!(
        table.get_primary().map(|p| p.columns.clone()),
        Some(vec!["id".to_owned()])
    );
}
