mod common;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use common::{at, open_driver};
use sqlite_todo::StoreError;
use sqlite_todo::db::{TaskDraft, TodoTaskClient};
use sqlite_todo::sqlite3::{Connection, SqliteDriver};
use sqlite_todo::types::{DateEncoding, Priority};
use tempfile::TempDir;

async fn task_client(encoding: DateEncoding) -> (TempDir, SqliteDriver, Connection, TodoTaskClient) {
    let (dir, driver, conn) = open_driver().await;
    let client = TodoTaskClient::new(driver.clone(), conn, encoding);
    client.initialize().await.expect("task schema failed");
    (dir, driver, conn, client)
}

#[tokio::test]
async fn insert_then_select_returns_one_unfinished_task() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let due = NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");

    let id = client
        .insert(&TaskDraft::new("Buy milk", due, Priority::Middle))
        .await
        .expect("insert failed");

    let tasks = client.select_all().await.expect("select failed");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_id, id);
    assert_eq!(tasks[0].content, "Buy milk");
    assert_eq!(tasks[0].limit_date, due);
    assert_eq!(tasks[0].priority, Priority::Middle);
    assert!(!tasks[0].is_finished);
}

#[tokio::test]
async fn insert_ignores_finished_flag() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let draft = TaskDraft {
        is_finished: true,
        ..TaskDraft::new("already done?", at(2024, 2, 1, 9, 0), Priority::High)
    };
    client.insert(&draft).await.expect("insert failed");
    let tasks = client.select_all().await.expect("select failed");
    assert!(tasks.iter().all(|t| !t.is_finished));
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let result = client
        .insert(&TaskDraft::new("", at(2024, 2, 1, 9, 0), Priority::High))
        .await;
    assert!(matches!(result, Err(StoreError::EmptyContent)));
    assert!(client.select_all().await.expect("select failed").is_empty());
}

#[tokio::test]
async fn select_all_orders_by_finished_due_priority_id() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let insert = |content: &'static str, due: NaiveDateTime, priority: Priority| {
        let client = client.clone();
        async move {
            client
                .insert(&TaskDraft::new(content, due, priority))
                .await
                .expect("insert failed")
        }
    };

    insert("late", at(2024, 3, 1, 8, 0), Priority::High).await;
    insert("early-low", at(2024, 1, 1, 8, 0), Priority::Low).await;
    insert("early-high", at(2024, 1, 1, 8, 0), Priority::High).await;
    let done = insert("done", at(2023, 12, 1, 8, 0), Priority::High).await;
    insert("early-high-2", at(2024, 1, 1, 8, 0), Priority::High).await;
    insert("next-morning", at(2024, 1, 2, 7, 0), Priority::High).await;
    client.update_finish(done, true).await.expect("finish failed");

    let order: Vec<String> = client
        .select_all()
        .await
        .expect("select failed")
        .into_iter()
        .map(|t| t.content)
        .collect();
    assert_eq!(
        order,
        [
            "early-high",
            "early-high-2",
            "early-low",
            "next-morning",
            "late",
            "done"
        ]
    );
}

#[tokio::test]
async fn due_date_round_trips_truncated_to_seconds() {
    for encoding in [DateEncoding::Sortable, DateEncoding::Locale] {
        let (_dir, _driver, _conn, client) = task_client(encoding).await;
        let due = NaiveDate::from_ymd_opt(2024, 7, 14)
            .expect("valid date")
            .and_hms_milli_opt(16, 45, 30, 999)
            .expect("valid time");
        client
            .insert(&TaskDraft::new("precise", due, Priority::Low).with_memo("ms dropped"))
            .await
            .expect("insert failed");

        let task = client
            .select_all()
            .await
            .expect("select failed")
            .pop()
            .expect("one task");
        assert_eq!(task.limit_date, due.with_nanosecond(0).expect("valid"));
        assert_eq!(task.memo.as_deref(), Some("ms dropped"));
    }
}

#[tokio::test]
async fn locale_encoding_stores_browser_text() {
    let (_dir, driver, conn, client) = task_client(DateEncoding::Locale).await;
    client
        .insert(&TaskDraft::new("tea", at(2024, 1, 5, 15, 4), Priority::Middle))
        .await
        .expect("insert failed");

    let mut stored = Vec::new();
    driver
        .exec_with(&conn, "SELECT LIMIT_DATE FROM TODO_TASK", |r| {
            stored.push(r.get_text("LIMIT_DATE").expect("LIMIT_DATE"))
        })
        .await
        .expect("select failed");
    assert_eq!(stored, ["1/5/2024, 3:04:00 PM"]);
}

#[tokio::test]
async fn select_all_reads_ja_jp_browser_dates() {
    let (_dir, driver, conn, client) = task_client(DateEncoding::Sortable).await;
    driver
        .exec(
            &conn,
            "INSERT INTO TODO_TASK (CONTENT, LIMIT_DATE, PRIORITY, IS_FINISHED) \
             VALUES ('tea', '2024/1/5 15:04:00', 2, 0)",
        )
        .await
        .expect("raw insert failed");

    let tasks = client.select_all().await.expect("select failed");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].limit_date, at(2024, 1, 5, 15, 4));
}

#[tokio::test]
async fn update_changes_only_the_target_row() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let first = client
        .insert(&TaskDraft::new("first", at(2024, 1, 1, 8, 0), Priority::High))
        .await
        .expect("insert failed");
    let second = client
        .insert(&TaskDraft::new("second", at(2024, 1, 2, 8, 0), Priority::High))
        .await
        .expect("insert failed");

    let before = client.select_all().await.expect("select failed");
    let mut edited = before
        .iter()
        .find(|t| t.task_id == second)
        .cloned()
        .expect("second task");
    edited.content = "second, edited".into();
    edited.priority = Priority::Low;
    edited.memo = Some("note".into());
    edited.is_finished = true;

    // Returned entities are detached until passed back in.
    assert_eq!(client.select_all().await.expect("select failed"), before);

    let changed = client.update(&edited).await.expect("update failed");
    assert_eq!(changed, 1);

    let after = client.select_all().await.expect("select failed");
    assert_eq!(after.len(), 2);
    let untouched = after.iter().find(|t| t.task_id == first).expect("first");
    assert_eq!(Some(untouched), before.iter().find(|t| t.task_id == first));
    let updated = after.iter().find(|t| t.task_id == second).expect("second");
    assert_eq!(updated, &edited);
}

#[tokio::test]
async fn update_finish_toggles_one_flag() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let id = client
        .insert(&TaskDraft::new("toggle", at(2024, 1, 1, 8, 0), Priority::High))
        .await
        .expect("insert failed");

    assert_eq!(client.update_finish(id, true).await.expect("finish"), 1);
    assert!(client.select_all().await.expect("select")[0].is_finished);
    assert_eq!(client.update_finish(id, false).await.expect("unfinish"), 1);
    assert!(!client.select_all().await.expect("select")[0].is_finished);
    assert_eq!(client.update_finish(id + 100, true).await.expect("missing"), 0);
}

#[tokio::test]
async fn delete_removes_exactly_one_row() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    let mut ids = Vec::new();
    for day in 1..=3 {
        let draft = TaskDraft::new(format!("day {day}"), at(2024, 1, day, 8, 0), Priority::Middle);
        ids.push(client.insert(&draft).await.expect("insert failed"));
    }

    assert_eq!(client.delete(ids[1]).await.expect("delete failed"), 1);
    let remaining: Vec<_> = client
        .select_all()
        .await
        .expect("select failed")
        .into_iter()
        .map(|t| t.task_id)
        .collect();
    assert_eq!(remaining, [ids[0], ids[2]]);
    assert_eq!(client.delete(ids[1]).await.expect("second delete"), 0);
}

#[tokio::test]
async fn truncate_empties_the_table() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    for day in 1..=4 {
        client
            .insert(&TaskDraft::new("t", at(2024, 1, day, 8, 0), Priority::Middle))
            .await
            .expect("insert failed");
    }
    assert_eq!(client.truncate_table().await.expect("truncate failed"), 4);
    assert!(client.select_all().await.expect("select failed").is_empty());
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let (_dir, _driver, _conn, client) = task_client(DateEncoding::Sortable).await;
    client
        .insert(&TaskDraft::new("kept", at(2024, 1, 1, 8, 0), Priority::Middle))
        .await
        .expect("insert failed");
    client.initialize().await.expect("second initialize failed");
    assert_eq!(client.select_all().await.expect("select failed").len(), 1);
}
