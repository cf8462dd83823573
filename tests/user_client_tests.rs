mod common;

use common::open_driver;
use sqlite_todo::StoreError;
use sqlite_todo::db::{UserInfo, UserInfoClient};
use tempfile::TempDir;

async fn user_client() -> (TempDir, UserInfoClient) {
    let (dir, driver, conn) = open_driver().await;
    let client = UserInfoClient::new(driver, conn);
    client.initialize().await.expect("user schema failed");
    (dir, client)
}

fn user(user_id: i64, name: &str) -> UserInfo {
    UserInfo {
        user_id,
        name: name.to_string(),
        age: 30,
        gender: "unspecified".to_string(),
    }
}

#[tokio::test]
async fn last_user_id_is_zero_when_empty() {
    let (_dir, client) = user_client().await;
    assert_eq!(client.get_last_user_id().await.expect("query failed"), 0);
    assert_eq!(client.next_user_id().await.expect("query failed"), 1);
}

#[tokio::test]
async fn last_user_id_is_the_maximum() {
    let (_dir, client) = user_client().await;
    client.insert(&user(7, "seven")).await.expect("insert 7");
    client.insert(&user(3, "three")).await.expect("insert 3");
    assert_eq!(client.get_last_user_id().await.expect("query failed"), 7);
}

#[tokio::test]
async fn select_all_orders_by_id() {
    let (_dir, client) = user_client().await;
    for (id, name) in [(5, "e"), (1, "a"), (3, "c")] {
        client.insert(&user(id, name)).await.expect("insert failed");
    }
    let users = client.select_all().await.expect("select failed");
    let ids: Vec<_> = users.iter().map(|u| u.user_id).collect();
    assert_eq!(ids, [1, 3, 5]);
    assert_eq!(users[0], user(1, "a"));
}

#[tokio::test]
async fn duplicate_id_is_a_database_error() {
    let (_dir, client) = user_client().await;
    client.insert(&user(1, "a")).await.expect("insert failed");
    let again = client.insert(&user(1, "b")).await;
    assert!(matches!(again, Err(StoreError::Database(_))));
}

#[tokio::test]
async fn update_delete_truncate() {
    let (_dir, client) = user_client().await;
    client.insert(&user(1, "a")).await.expect("insert 1");
    client.insert(&user(2, "b")).await.expect("insert 2");

    let renamed = UserInfo {
        age: 41,
        gender: "f".into(),
        ..user(2, "bee")
    };
    assert_eq!(client.update(&renamed).await.expect("update failed"), 1);
    let users = client.select_all().await.expect("select failed");
    assert_eq!(users, [user(1, "a"), renamed]);

    assert_eq!(client.delete(1).await.expect("delete failed"), 1);
    assert_eq!(client.select_all().await.expect("select failed").len(), 1);

    assert_eq!(client.truncate_table().await.expect("truncate failed"), 1);
    assert!(client.select_all().await.expect("select failed").is_empty());
    assert_eq!(client.get_last_user_id().await.expect("query failed"), 0);
}
