use crate::db::models::{
    Contact, ContactForm, Letter, LetterForm, NewUser, Policy, PolicyForm, User, UserUpdate,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::AgencyError;
use crate::service::search::{ContactQuery, MatchMode, like_pattern};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error as SqlxError, Pool, Sqlite, SqliteExecutor};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

const USER_COLUMNS: &str = "id, first, last, username, password_hash, phonenumber, dob, isadmin";
const CONTACT_COLUMNS: &str = "id, first, last, street, city, state, zipcode, phonenumber";
const POLICY_COLUMNS: &str = "id, policy_number, policy_type, contact_id";
const LETTER_COLUMNS: &str = "id, title, description, template";

/// Request-scoped handle over the agency tables. Cloning shares the pool.
#[derive(Clone)]
pub struct AgencyStore {
    pool: SqlitePool,
}

impl AgencyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` with
    /// foreign keys enforced, and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, AgencyError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        info!(database_url = %database_url, "agency store ready");
        Ok(store)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), AgencyError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- users ----

    pub async fn insert_user(&self, user: NewUser) -> Result<User, AgencyError> {
        let sql = format!(
            r#"INSERT INTO "User" (first, last, username, password_hash, phonenumber, dob, isadmin)
               VALUES (?, ?, ?, ?, ?, ?, 0)
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.first)
            .bind(user.last)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.phonenumber)
            .bind(user.dob)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "user"))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AgencyError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "User" WHERE username = ?"#);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AgencyError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "User" WHERE id = ?"#);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AgencyError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "User" ORDER BY id"#);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, AgencyError> {
        let sql = format!(
            r#"UPDATE "User" SET
                first = ?,
                last = ?,
                username = ?,
                password_hash = COALESCE(?, password_hash),
                phonenumber = ?,
                dob = ?,
                isadmin = ?
              WHERE id = ?
              RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(update.first)
            .bind(update.last)
            .bind(update.username)
            .bind(update.password_hash)
            .bind(update.phonenumber)
            .bind(update.dob)
            .bind(update.admin)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "user"))
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool, AgencyError> {
        let res = sqlx::query(r#"DELETE FROM "User" WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // ---- contacts ----

    pub async fn insert_contact(&self, form: ContactForm) -> Result<Contact, AgencyError> {
        let sql = format!(
            r#"INSERT INTO "Contact" (first, last, street, city, state, zipcode, phonenumber)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               RETURNING {CONTACT_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(form.first)
            .bind(form.last)
            .bind(form.street)
            .bind(form.city)
            .bind(form.state)
            .bind(form.zipcode)
            .bind(form.phonenumber)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn get_contact(&self, id: i64) -> Result<Option<Contact>, AgencyError> {
        let sql = format!(r#"SELECT {CONTACT_COLUMNS} FROM "Contact" WHERE id = ?"#);
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>, AgencyError> {
        let sql = format!(r#"SELECT {CONTACT_COLUMNS} FROM "Contact" ORDER BY id"#);
        Ok(sqlx::query_as::<_, Contact>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn update_contact(
        &self,
        id: i64,
        form: ContactForm,
    ) -> Result<Option<Contact>, AgencyError> {
        let sql = format!(
            r#"UPDATE "Contact" SET
                first = ?,
                last = ?,
                street = ?,
                city = ?,
                state = ?,
                zipcode = ?,
                phonenumber = ?
              WHERE id = ?
              RETURNING {CONTACT_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(form.first)
            .bind(form.last)
            .bind(form.street)
            .bind(form.city)
            .bind(form.state)
            .bind(form.zipcode)
            .bind(form.phonenumber)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Delete a contact that owns no policies. Returns false if it did not exist.
    pub async fn delete_contact(&self, id: i64) -> Result<bool, AgencyError> {
        let mut tx = self.pool.begin().await?;

        let owned: (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM "Policy" WHERE contact_id = ?"#)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if owned.0 > 0 {
            return Err(AgencyError::Conflict(format!(
                "contact {id} still owns {} policies",
                owned.0
            )));
        }

        let deleted = delete_contact_row(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Substring filter over first name, last name and phone, ANDed, by id.
    pub async fn search_contacts(
        &self,
        query: &ContactQuery,
        mode: MatchMode,
    ) -> Result<Vec<Contact>, AgencyError> {
        let (predicate, first, last, phone) = match mode {
            MatchMode::CaseSensitive => (
                "instr(first, ?) > 0 AND instr(last, ?) > 0 AND instr(phonenumber, ?) > 0",
                query.first.clone(),
                query.last.clone(),
                query.phone.clone(),
            ),
            MatchMode::AsciiCaseInsensitive => (
                r"first LIKE ? ESCAPE '\' AND last LIKE ? ESCAPE '\' AND phonenumber LIKE ? ESCAPE '\'",
                like_pattern(&query.first),
                like_pattern(&query.last),
                like_pattern(&query.phone),
            ),
        };
        let sql = format!(r#"SELECT {CONTACT_COLUMNS} FROM "Contact" WHERE {predicate} ORDER BY id"#);
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(first)
            .bind(last)
            .bind(phone)
            .fetch_all(&self.pool)
            .await?)
    }

    // ---- policies ----

    pub async fn insert_policy(&self, form: PolicyForm) -> Result<Policy, AgencyError> {
        let sql = format!(
            r#"INSERT INTO "Policy" (policy_number, policy_type, contact_id)
               VALUES (?, ?, ?)
               RETURNING {POLICY_COLUMNS}"#
        );
        sqlx::query_as::<_, Policy>(&sql)
            .bind(form.policy_number)
            .bind(form.policy_type)
            .bind(form.contact_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "policy"))
    }

    pub async fn get_policy(&self, id: i64) -> Result<Option<Policy>, AgencyError> {
        let sql = format!(r#"SELECT {POLICY_COLUMNS} FROM "Policy" WHERE id = ?"#);
        Ok(sqlx::query_as::<_, Policy>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_policies(&self) -> Result<Vec<Policy>, AgencyError> {
        let sql = format!(r#"SELECT {POLICY_COLUMNS} FROM "Policy" ORDER BY id"#);
        Ok(sqlx::query_as::<_, Policy>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn policies_for_contact(&self, contact_id: i64) -> Result<Vec<Policy>, AgencyError> {
        let sql = format!(r#"SELECT {POLICY_COLUMNS} FROM "Policy" WHERE contact_id = ? ORDER BY id"#);
        Ok(sqlx::query_as::<_, Policy>(&sql)
            .bind(contact_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update_policy(&self, id: i64, form: PolicyForm) -> Result<Option<Policy>, AgencyError> {
        let sql = format!(
            r#"UPDATE "Policy" SET
                policy_number = ?,
                policy_type = ?,
                contact_id = ?
              WHERE id = ?
              RETURNING {POLICY_COLUMNS}"#
        );
        sqlx::query_as::<_, Policy>(&sql)
            .bind(form.policy_number)
            .bind(form.policy_type)
            .bind(form.contact_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "policy"))
    }

    pub async fn delete_policy(&self, id: i64) -> Result<bool, AgencyError> {
        let res = sqlx::query(r#"DELETE FROM "Policy" WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // ---- letters ----

    pub async fn insert_letter(&self, form: LetterForm) -> Result<Letter, AgencyError> {
        let sql = format!(
            r#"INSERT INTO "Letter" (title, description, template)
               VALUES (?, ?, ?)
               RETURNING {LETTER_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Letter>(&sql)
            .bind(form.title)
            .bind(form.description)
            .bind(form.template)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn get_letter(&self, id: i64) -> Result<Option<Letter>, AgencyError> {
        let sql = format!(r#"SELECT {LETTER_COLUMNS} FROM "Letter" WHERE id = ?"#);
        Ok(sqlx::query_as::<_, Letter>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_letters(&self) -> Result<Vec<Letter>, AgencyError> {
        let sql = format!(r#"SELECT {LETTER_COLUMNS} FROM "Letter" ORDER BY id"#);
        Ok(sqlx::query_as::<_, Letter>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn update_letter(&self, id: i64, form: LetterForm) -> Result<Option<Letter>, AgencyError> {
        let sql = format!(
            r#"UPDATE "Letter" SET
                title = ?,
                description = ?,
                template = ?
              WHERE id = ?
              RETURNING {LETTER_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Letter>(&sql)
            .bind(form.title)
            .bind(form.description)
            .bind(form.template)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn delete_letter(&self, id: i64) -> Result<bool, AgencyError> {
        let res = sqlx::query(r#"DELETE FROM "Letter" WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// A policy written after the ownership check still surfaces as a conflict.
async fn delete_contact_row<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<u64, AgencyError> {
    let res = sqlx::query(r#"DELETE FROM "Contact" WHERE id = ?"#)
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| constraint_error(e, "contact"))?;
    Ok(res.rows_affected())
}

/// Map store constraint failures to a conflict; anything else stays a database error.
fn constraint_error(err: SqlxError, what: &str) -> AgencyError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AgencyError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return AgencyError::Conflict(format!("{what} references a missing record"));
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use tempfile::TempDir;

    async fn store() -> (AgencyStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}", dir.path().join("store.sqlite").display());
        (AgencyStore::connect(&url).await.unwrap(), dir)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            first: "Ann".into(),
            last: "Lee".into(),
            username: username.into(),
            password_hash: "$argon2id$stub".into(),
            phonenumber: "555-1212".into(),
            dob: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn schema_init_is_repeatable() {
        let (store, _dir) = store().await;
        store.init_schema().await.unwrap();
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let (store, _dir) = store().await;
        let ann = store.insert_user(new_user("ann")).await.unwrap();
        assert!(!ann.admin);
        assert_eq!(
            store.find_user_by_username("ann").await.unwrap(),
            Some(ann)
        );

        let err = store.insert_user(new_user("ann")).await.unwrap_err();
        assert!(matches!(err, AgencyError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_without_password_keeps_the_hash() {
        let (store, _dir) = store().await;
        let ann = store.insert_user(new_user("ann")).await.unwrap();
        let updated = store
            .update_user(
                ann.id,
                UserUpdate {
                    first: "Anne".into(),
                    last: ann.last.clone(),
                    username: ann.username.clone(),
                    password_hash: None,
                    phonenumber: ann.phonenumber.clone(),
                    dob: ann.dob,
                    admin: true,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.first, "Anne");
        assert!(updated.admin);
        assert_eq!(updated.password_hash, ann.password_hash);
    }

    #[tokio::test]
    async fn policies_follow_their_contact() {
        let (store, _dir) = store().await;
        let contact = store
            .insert_contact(ContactForm {
                first: "Ann".into(),
                last: "Lee".into(),
                street: "1 Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zipcode: "62701".into(),
                phonenumber: "555-1212".into(),
            })
            .await
            .unwrap();
        let policy = store
            .insert_policy(PolicyForm {
                policy_number: Some(7),
                policy_type: Some("Auto".into()),
                contact_id: Some(contact.id),
            })
            .await
            .unwrap();

        assert_eq!(
            store.policies_for_contact(contact.id).await.unwrap(),
            vec![policy.clone()]
        );
        assert!(matches!(
            store.delete_contact(contact.id).await.unwrap_err(),
            AgencyError::Conflict(_)
        ));

        assert!(store.delete_policy(policy.id).await.unwrap());
        assert!(store.delete_contact(contact.id).await.unwrap());
        assert!(!store.delete_contact(contact.id).await.unwrap());
    }

    fn contact_form(first: &str, last: &str, phone: &str) -> ContactForm {
        ContactForm {
            first: first.into(),
            last: last.into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zipcode: "62701".into(),
            phonenumber: phone.into(),
        }
    }

    #[tokio::test]
    async fn deleting_a_contact_row_that_policies_reference_is_a_conflict() {
        let (store, _dir) = store().await;
        let contact = store
            .insert_contact(contact_form("Ann", "Lee", "555-1212"))
            .await
            .unwrap();
        store
            .insert_policy(PolicyForm {
                contact_id: Some(contact.id),
                ..PolicyForm::default()
            })
            .await
            .unwrap();

        let err = delete_contact_row(&store.pool, contact.id).await.unwrap_err();
        assert!(matches!(err, AgencyError::Conflict(_)), "{err:?}");
        assert!(store.get_contact(contact.id).await.unwrap().is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn sql_search_agrees_with_the_in_memory_predicate(
            people in proptest::collection::vec(
                ("[aAbB%_\\\\]{0,4}", "[aAbB%_\\\\]{0,4}", "[0-2%_-]{0,4}"),
                0..10,
            ),
            first in "[aAbB%_\\\\]{0,2}",
            last in "[aAbB%_\\\\]{0,2}",
            phone in "[0-2%_-]{0,2}",
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let (store, _dir) = store().await;
                for (f, l, p) in &people {
                    store.insert_contact(contact_form(f, l, p)).await.unwrap();
                }
                let all = store.list_contacts().await.unwrap();
                let query = ContactQuery::new(first.clone(), last.clone(), phone.clone());

                for mode in [MatchMode::CaseSensitive, MatchMode::AsciiCaseInsensitive] {
                    let expected: Vec<Contact> = all
                        .iter()
                        .filter(|c| query.matches(c, mode))
                        .cloned()
                        .collect();
                    let found = store.search_contacts(&query, mode).await.unwrap();
                    assert_eq!(found, expected, "{mode:?} {query:?}");
                }
            });
        }
    }
}
