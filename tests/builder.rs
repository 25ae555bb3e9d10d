//! Builder coverage: joins, unions, pagination, DML and the binding
//! invariants that keep placeholders and values aligned.

mod common;

use common::{MockExecutor, row};
use pretty_assertions::assert_eq;
use quern::{Builder, ExecResult, Mysql, Postgres, Sqlite, Sqlserver, Value};
use std::sync::Arc;

fn mysql() -> Builder {
    Builder::new(Arc::new(Mysql))
}

fn postgres() -> Builder {
    Builder::new(Arc::new(Postgres))
}

/// Extracts the numeric suffixes of `$N` placeholders in order.
fn dollar_params(sql: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            continue;
        }
        let mut digits = String::new();
        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            digits.push(*d);
            chars.next();
        }
        if let Ok(n) = digits.parse() {
            out.push(n);
        }
    }
    out
}

#[test]
fn test_basic_joins() {
    let mut qb = mysql();
    qb.table("users")
        .join("posts", "users.id", "=", "posts.user_id");
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `users` inner join `posts` on `users`.`id` = `posts`.`user_id`"
    );

    let mut qb = mysql();
    qb.table("users")
        .left_join("posts", "users.id", "=", "posts.user_id")
        .cross_join("tags");
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `users` left join `posts` on `users`.`id` = `posts`.`user_id` cross join `tags`"
    );
}

#[test]
fn test_join_closure_with_bindings() {
    let mut qb = postgres();
    qb.table("users")
        .join_with("posts", |j| {
            j.on("users.id", "=", "posts.user_id")
                .where_op("posts.votes", ">", 100);
        })
        .where_("users.active", true);

    assert_eq!(
        qb.to_sql().unwrap(),
        r#"select * from "users" inner join "posts" on "users"."id" = "posts"."user_id" and "posts"."votes" > $1 where "users"."active" = $2"#
    );
    assert_eq!(qb.get_bindings(), vec![Value::Int(100), Value::Bool(true)]);
}

#[test]
fn test_unions_with_order_and_limit() {
    let mut qb = mysql();
    qb.table("a")
        .where_("kind", 1)
        .union(|q| {
            q.table("b").where_("kind", 2);
        })
        .union_order_by_desc("id")
        .union_limit(3);

    assert_eq!(
        qb.to_sql().unwrap(),
        "(select * from `a` where `kind` = ?) union (select * from `b` where `kind` = ?) order by `id` desc limit 3"
    );
    assert_eq!(qb.get_bindings(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_union_numbering_spans_arms() {
    let mut qb = postgres();
    qb.table("a").where_("x", 1).union_all(|q| {
        q.table("b").where_("y", 2);
    });
    let sql = qb.to_sql().unwrap();
    assert_eq!(
        sql,
        r#"(select * from "a" where "x" = $1) union all (select * from "b" where "y" = $2)"#
    );
    assert_eq!(dollar_params(&sql), vec![1, 2]);
}

#[test]
fn test_sqlserver_pagination() {
    let mut qb = Builder::new(Arc::new(Sqlserver));
    qb.table("t").limit(10).offset(5);
    assert_eq!(
        qb.to_sql().unwrap(),
        r#"select * from "t" order by (select 0) offset 5 rows fetch next 10 rows only"#
    );

    let mut qb = Builder::new(Arc::new(Sqlserver));
    qb.table("t").where_("a", 1).order_by("id").limit(10);
    assert_eq!(
        qb.to_sql().unwrap(),
        r#"select * from "t" where "a" = @p1 order by "id" asc offset 0 rows fetch next 10 rows only"#
    );
}

#[test]
fn test_select_sub_and_from_sub_numbering() {
    let mut qb = postgres();
    qb.table("users")
        .select(["name"])
        .select_sub(
            |sub| {
                sub.table("posts")
                    .select_raw("count(*)")
                    .where_op("posts.votes", ">", 10);
            },
            "hot_posts",
        )
        .where_("active", true);

    let sql = qb.to_sql().unwrap();
    assert_eq!(
        sql,
        r#"select "name", (select count(*) from "posts" where "posts"."votes" > $1) as "hot_posts" from "users" where "active" = $2"#
    );
    assert_eq!(qb.get_bindings(), vec![Value::Int(10), Value::Bool(true)]);

    let mut qb = postgres();
    qb.from_sub(
        |sub| {
            sub.table("scores").where_op("score", ">", 90);
        },
        "top",
    )
    .where_("active", true);
    assert_eq!(
        qb.to_sql().unwrap(),
        r#"select * from (select * from "scores" where "score" > $1) as "top" where "active" = $2"#
    );
}

#[test]
fn test_trailing_clauses() {
    let mut qb = mysql();
    qb.table("t")
        .select(["kind"])
        .group_by(["kind"])
        .having("cnt", ">", 5)
        .order_by_desc("kind")
        .limit(10)
        .offset(20);
    assert_eq!(
        qb.to_sql().unwrap(),
        "select `kind` from `t` group by `kind` having `cnt` > ? order by `kind` desc limit 10 offset 20"
    );
    assert_eq!(qb.get_bindings(), vec![Value::Int(5)]);
}

#[test]
fn test_for_page() {
    let mut qb = mysql();
    qb.table("t").for_page(3, 15);
    assert_eq!(qb.to_sql().unwrap(), "select * from `t` limit 15 offset 30");
}

#[test]
fn test_distinct() {
    let mut qb = mysql();
    qb.table("t").distinct().select(["kind"]);
    assert_eq!(qb.to_sql().unwrap(), "select distinct `kind` from `t`");
}

#[test]
fn test_where_in_variants() {
    let mut qb = postgres();
    qb.table("t").where_in("id", [1, 2, 3]);
    let sql = qb.to_sql().unwrap();
    assert_eq!(sql, r#"select * from "t" where "id" in ($1, $2, $3)"#);
    assert_eq!(qb.get_bindings().len(), 3);

    let mut qb = mysql();
    qb.table("t").where_not_in("id", [7, 8]);
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `t` where `id` not in (?, ?)"
    );

    // dynamic empty lists degrade to constant predicates
    let mut qb = mysql();
    qb.table("t").where_in("id", Vec::<i64>::new());
    assert_eq!(qb.to_sql().unwrap(), "select * from `t` where 0 = 1");
    assert!(qb.get_bindings().is_empty());
}

#[test]
fn test_where_between() {
    let mut qb = mysql();
    qb.table("t").where_between("score", 60, 90);
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `t` where `score` between ? and ?"
    );
    assert_eq!(qb.get_bindings(), vec![Value::Int(60), Value::Int(90)]);

    let mut qb = mysql();
    qb.table("t").where_not_between("score", 60, 90);
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `t` where `score` not between ? and ?"
    );
}

#[test]
fn test_where_exists() {
    let mut qb = postgres();
    qb.table("users").where_exists(|sub| {
        sub.table("posts")
            .where_column("posts.user_id", "=", "users.id");
    });
    assert_eq!(
        qb.to_sql().unwrap(),
        r#"select * from "users" where exists (select * from "posts" where "posts"."user_id" = "users"."id")"#
    );
}

#[test]
fn test_where_raw_bindings_are_renumbered() {
    let mut qb = postgres();
    qb.table("t")
        .where_("a", 1)
        .where_raw_bindings("b > ? and c < ?", [2, 3]);
    let sql = qb.to_sql().unwrap();
    assert_eq!(
        sql,
        r#"select * from "t" where "a" = $1 and b > $2 and c < $3"#
    );
    assert_eq!(dollar_params(&sql), vec![1, 2, 3]);
    assert_eq!(qb.get_bindings().len(), 3);
}

#[test]
fn test_escaped_question_mark_stays_literal() {
    let mut qb = postgres();
    qb.table("t").where_raw("tags ?? 'rust'");
    assert_eq!(qb.to_sql().unwrap(), r#"select * from "t" where tags ? 'rust'"#);
    assert!(qb.get_bindings().is_empty());
}

#[test]
fn test_invalid_operator_is_a_usage_error() {
    let mut qb = mysql();
    qb.table("t").where_op("a", "<=>", 1);
    let err = qb.to_sql().unwrap_err();
    assert!(matches!(err, quern::QuernError::Usage(_)), "got {err}");
}

#[test]
fn test_order_by_direction_and_raw() {
    let mut qb = mysql();
    qb.table("t").order_by("a").order_by_desc("b").order_by_raw("rand()");
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `t` order by `a` asc, `b` desc, rand()"
    );
}

#[test]
fn test_locks() {
    let mut qb = mysql();
    qb.table("t").where_("id", 1).lock_for_update();
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `t` where `id` = ? for update"
    );

    let mut qb = postgres();
    qb.table("t").shared_lock();
    assert_eq!(qb.to_sql().unwrap(), r#"select * from "t" for share"#);
}

#[test]
fn test_placeholder_count_matches_bindings() {
    let mut qb = postgres();
    qb.table("orders")
        .select_raw_bindings("case when total > ? then 1 else 0 end as big", [1000])
        .join_with("customers", |j| {
            j.on("customers.id", "=", "orders.customer_id")
                .where_op("customers.tier", ">", 2);
        })
        .where_op("total", ">", 10.5)
        .where_group(|q| {
            q.where_in("status", ["open", "held"]);
            q.or_where_null("closed_at");
        })
        .having("cnt", ">", 1)
        .group_by(["customer_id"])
        .union(|q| {
            q.table("archived_orders").where_("total", 0);
        });

    let sql = qb.to_sql().unwrap();
    let params = dollar_params(&sql);
    let expected: Vec<usize> = (1..=qb.get_bindings().len()).collect();
    assert_eq!(params, expected, "sql was: {sql}");

    // qmark dialects: placeholder count equals binding count
    let mut qb = mysql();
    qb.table("t")
        .where_op("a", ">", 1)
        .where_in("b", [1, 2, 3])
        .where_between("c", 4, 5)
        .having("d", "=", 6);
    let sql = qb.to_sql().unwrap();
    let qmarks = sql.matches('?').count();
    assert_eq!(qmarks, qb.get_bindings().len());
}

#[test]
fn test_nested_group_parentheses_and_booleans() {
    let mut qb = mysql();
    qb.table("t").where_("a", 1).or_where_group(|q| {
        q.where_("b", 2);
        q.or_where("c", 3);
    });
    assert_eq!(
        qb.to_sql().unwrap(),
        "select * from `t` where `a` = ? or (`b` = ? or `c` = ?)"
    );
}

#[test]
fn test_count_and_exists() {
    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![row(&[("aggregate", Value::Int(42))])]);
    let mut qb = Builder::with_executor(Arc::new(Mysql), executor.clone());
    qb.table("t").where_op("score", ">", 90);
    assert_eq!(qb.count().unwrap(), 42);
    assert_eq!(
        executor.statements(),
        vec!["select count(*) as aggregate from `t` where `score` > ?"]
    );

    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![row(&[("exists", Value::Bool(true))])]);
    let mut qb = Builder::with_executor(Arc::new(Postgres), executor.clone());
    qb.table("t").where_("id", 9);
    assert!(qb.exists().unwrap());
    assert_eq!(
        executor.statements(),
        vec![r#"select exists(select * from "t" where "id" = $1) as "exists""#]
    );
}

#[test]
fn test_insert_update_delete() {
    let executor = Arc::new(MockExecutor::new());
    executor.push_exec(ExecResult {
        rows_affected: 2,
        last_insert_id: None,
    });
    let mut qb = Builder::with_executor(Arc::new(Mysql), executor.clone());
    qb.table("users");
    let result = qb
        .insert(vec![
            row(&[
                ("email", Value::Text("john@quern.dev".into())),
                ("vote", Value::Int(10)),
            ]),
            row(&[
                ("email", Value::Text("lee@quern.dev".into())),
                ("vote", Value::Int(5)),
            ]),
        ])
        .unwrap();
    assert_eq!(result.rows_affected, 2);
    let calls = executor.calls();
    assert_eq!(
        calls[0].0,
        "insert into `users` (`email`, `vote`) values (?, ?), (?, ?)"
    );
    assert_eq!(
        calls[0].1,
        vec![
            Value::Text("john@quern.dev".into()),
            Value::Int(10),
            Value::Text("lee@quern.dev".into()),
            Value::Int(5),
        ]
    );

    let executor = Arc::new(MockExecutor::new());
    executor.push_exec(ExecResult {
        rows_affected: 1,
        last_insert_id: None,
    });
    let mut qb = Builder::with_executor(Arc::new(Postgres), executor.clone());
    qb.table("users").where_("id", 7);
    let affected = qb.update(row(&[("vote", Value::Int(11))])).unwrap();
    assert_eq!(affected, 1);
    let calls = executor.calls();
    assert_eq!(calls[0].0, r#"update "users" set "vote" = $1 where "id" = $2"#);
    assert_eq!(calls[0].1, vec![Value::Int(11), Value::Int(7)]);

    let executor = Arc::new(MockExecutor::new());
    let mut qb = Builder::with_executor(Arc::new(Mysql), executor.clone());
    qb.table("users").where_op("vote", "<", 1);
    qb.delete().unwrap();
    assert_eq!(
        executor.statements(),
        vec!["delete from `users` where `vote` < ?"]
    );
}

#[test]
fn test_insert_get_id_uses_returning_on_postgres() {
    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![row(&[("id", Value::Int(5))])]);
    let mut qb = Builder::with_executor(Arc::new(Postgres), executor.clone());
    qb.table("users");
    let id = qb
        .insert_get_id(row(&[("email", Value::Text("ken@quern.dev".into()))]))
        .unwrap();
    assert_eq!(id, 5);
    assert_eq!(
        executor.statements(),
        vec![r#"insert into "users" ("email") values ($1) returning "id""#]
    );

    let executor = Arc::new(MockExecutor::new());
    executor.push_exec(ExecResult {
        rows_affected: 1,
        last_insert_id: Some(9),
    });
    let mut qb = Builder::with_executor(Arc::new(Mysql), executor.clone());
    qb.table("users");
    let id = qb
        .insert_get_id(row(&[("email", Value::Text("ken@quern.dev".into()))]))
        .unwrap();
    assert_eq!(id, 9);
}

#[test]
fn test_truncate() {
    let executor = Arc::new(MockExecutor::new());
    let mut qb = Builder::with_executor(Arc::new(Sqlite), executor.clone());
    qb.table("logs");
    qb.truncate().unwrap();
    assert_eq!(executor.statements(), vec!["delete from `logs`"]);

    let executor = Arc::new(MockExecutor::new());
    let mut qb = Builder::with_executor(Arc::new(Mysql), executor.clone());
    qb.table("logs");
    qb.truncate().unwrap();
    assert_eq!(executor.statements(), vec!["truncate table `logs`"]);
}

#[test]
fn test_first_and_find() {
    let executor = Arc::new(MockExecutor::new());
    executor.push_rows(vec![row(&[("id", Value::Int(1))])]);
    let mut qb = Builder::with_executor(Arc::new(Mysql), executor.clone());
    qb.table("users");
    let found = qb.find(1).unwrap();
    assert_eq!(found.and_then(|r| r.get("id").cloned()), Some(Value::Int(1)));
    assert_eq!(
        executor.statements(),
        vec!["select * from `users` where `id` = ? limit 1"]
    );
}

#[test]
fn test_for_driver_uses_global_registry() {
    let mut qb = Builder::for_driver("mysql").unwrap();
    qb.table("t");
    assert_eq!(qb.to_sql().unwrap(), "select * from `t`");
    assert!(Builder::for_driver("oracle").is_err());
}
