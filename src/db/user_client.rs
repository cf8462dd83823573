use crate::db::models::{UserId, UserInfo};
use crate::db::schema::USER_INFO_INIT;
use crate::error::StoreError;
use crate::sqlite3::{Connection, FromRecord, Record, SqliteDriver, Statement};

/// Typed access to `USER_INFO`.
#[derive(Clone)]
pub struct UserInfoClient {
    driver: SqliteDriver,
    conn: Connection,
}

struct LastUserId(Option<UserId>);

impl FromRecord for LastUserId {
    const COLUMNS: &'static [&'static str] = &["LAST_USER_ID"];

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        Ok(Self(record.get_opt_i64("LAST_USER_ID")?))
    }
}

impl UserInfoClient {
    pub fn new(driver: SqliteDriver, conn: Connection) -> Self {
        Self { driver, conn }
    }

    pub fn with_connection(&self, conn: Connection) -> Self {
        Self {
            driver: self.driver.clone(),
            conn,
        }
    }

    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.driver.exec(&self.conn, USER_INFO_INIT).await?;
        Ok(())
    }

    pub async fn select_all(&self) -> Result<Vec<UserInfo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM USER_INFO ORDER BY USER_ID ASC",
            UserInfo::select_list()
        );
        self.driver.fetch_all(&self.conn, sql).await
    }

    pub async fn insert(&self, user: &UserInfo) -> Result<(), StoreError> {
        let stmt = Statement::new(
            "INSERT INTO USER_INFO(USER_ID, NAME, AGE, GENDER) VALUES (:user_id, :name, :age, :gender)",
        )
        .bind_named("user_id", user.user_id)
        .bind_named("name", user.name.as_str())
        .bind_named("age", user.age)
        .bind_named("gender", user.gender.as_str());
        self.driver.exec(&self.conn, stmt).await?;
        Ok(())
    }

    pub async fn update(&self, user: &UserInfo) -> Result<u64, StoreError> {
        let stmt = Statement::new(
            r#"UPDATE USER_INFO SET
                NAME = ?,
                AGE = ?,
                GENDER = ?
            WHERE USER_ID = ?"#,
        )
        .bind(user.name.as_str())
        .bind(user.age)
        .bind(user.gender.as_str())
        .bind(user.user_id);
        let summary = self.driver.exec(&self.conn, stmt).await?;
        Ok(summary.rows_affected)
    }

    pub async fn delete(&self, user_id: UserId) -> Result<u64, StoreError> {
        let stmt = Statement::new("DELETE FROM USER_INFO WHERE USER_ID = ?").bind(user_id);
        let summary = self.driver.exec(&self.conn, stmt).await?;
        Ok(summary.rows_affected)
    }

    pub async fn truncate_table(&self) -> Result<u64, StoreError> {
        let summary = self.driver.exec(&self.conn, "DELETE FROM USER_INFO").await?;
        Ok(summary.rows_affected)
    }

    /// Highest `USER_ID` present, or 0 for an empty table.
    pub async fn get_last_user_id(&self) -> Result<UserId, StoreError> {
        let rows: Vec<LastUserId> = self
            .driver
            .fetch_all(
                &self.conn,
                "SELECT max(USER_ID) AS LAST_USER_ID FROM USER_INFO",
            )
            .await?;
        Ok(rows.into_iter().next().and_then(|r| r.0).unwrap_or(0))
    }

    pub async fn next_user_id(&self) -> Result<UserId, StoreError> {
        Ok(self.get_last_user_id().await? + 1)
    }
}
