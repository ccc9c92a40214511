//! JSON CRUD console over the four agency tables.
//!
//! Each table plugs in through [`AdminResource`]; the handlers and routes are
//! generic over it. All routes require an admin session.

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::auth::password::hash_password_blocking;
use crate::db::models::{
    Contact, ContactDetail, ContactForm, Letter, LetterForm, Policy, PolicyForm, User, UserUpdate,
};
use crate::db::record::{AsFieldMap, FieldMap, to_field_maps};
use crate::db::sqlite::AgencyStore;
use crate::error::AgencyError;
use crate::middleware::auth::RequireAdmin;
use crate::middleware::form::{RequiredJson, RequiredPath};
use crate::router::AppState;
use crate::types::admin::UserAdminForm;

#[async_trait]
pub trait AdminResource: Send + Sync + 'static {
    /// Path segment under `/admin/api`.
    const NAME: &'static str;

    type Row: Serialize + Send + Sync;
    type Detail: Serialize + Send;
    type Form: DeserializeOwned + Send + 'static;

    async fn list(store: &AgencyStore) -> Result<Vec<Self::Row>, AgencyError>;

    async fn detail(store: &AgencyStore, id: i64) -> Result<Option<Self::Detail>, AgencyError>;

    /// Tables that cannot be created through the console keep this default.
    async fn create(_store: &AgencyStore, _form: Self::Form) -> Result<Self::Row, AgencyError> {
        Err(AgencyError::MethodNotAllowed(format!(
            "{} cannot be created here",
            Self::NAME
        )))
    }

    async fn update(
        store: &AgencyStore,
        id: i64,
        form: Self::Form,
    ) -> Result<Option<Self::Row>, AgencyError>;

    async fn delete(store: &AgencyStore, id: i64) -> Result<bool, AgencyError>;
}

pub struct Users;
pub struct Contacts;
pub struct Policies;
pub struct Letters;

#[async_trait]
impl AdminResource for Users {
    const NAME: &'static str = "users";

    type Row = User;
    type Detail = User;
    type Form = UserAdminForm;

    async fn list(store: &AgencyStore) -> Result<Vec<User>, AgencyError> {
        store.list_users().await
    }

    async fn detail(store: &AgencyStore, id: i64) -> Result<Option<User>, AgencyError> {
        store.get_user(id).await
    }

    async fn update(
        store: &AgencyStore,
        id: i64,
        form: UserAdminForm,
    ) -> Result<Option<User>, AgencyError> {
        let password_hash = match form.password {
            Some(password) => Some(hash_password_blocking(password).await?),
            None => None,
        };
        let update = UserUpdate {
            first: form.first,
            last: form.last,
            username: form.username,
            password_hash,
            phonenumber: form.phonenumber,
            dob: form.dob,
            admin: form.admin,
        };
        store.update_user(id, update).await
    }

    async fn delete(store: &AgencyStore, id: i64) -> Result<bool, AgencyError> {
        store.delete_user(id).await
    }
}

#[async_trait]
impl AdminResource for Contacts {
    const NAME: &'static str = "contacts";

    type Row = Contact;
    type Detail = ContactDetail;
    type Form = ContactForm;

    async fn list(store: &AgencyStore) -> Result<Vec<Contact>, AgencyError> {
        store.list_contacts().await
    }

    async fn detail(store: &AgencyStore, id: i64) -> Result<Option<ContactDetail>, AgencyError> {
        let Some(contact) = store.get_contact(id).await? else {
            return Ok(None);
        };
        let policies = store.policies_for_contact(id).await?;
        Ok(Some(ContactDetail { contact, policies }))
    }

    async fn create(store: &AgencyStore, form: ContactForm) -> Result<Contact, AgencyError> {
        store.insert_contact(form).await
    }

    async fn update(
        store: &AgencyStore,
        id: i64,
        form: ContactForm,
    ) -> Result<Option<Contact>, AgencyError> {
        store.update_contact(id, form).await
    }

    async fn delete(store: &AgencyStore, id: i64) -> Result<bool, AgencyError> {
        store.delete_contact(id).await
    }
}

#[async_trait]
impl AdminResource for Policies {
    const NAME: &'static str = "policies";

    type Row = Policy;
    type Detail = Policy;
    type Form = PolicyForm;

    async fn list(store: &AgencyStore) -> Result<Vec<Policy>, AgencyError> {
        store.list_policies().await
    }

    async fn detail(store: &AgencyStore, id: i64) -> Result<Option<Policy>, AgencyError> {
        store.get_policy(id).await
    }

    async fn create(store: &AgencyStore, form: PolicyForm) -> Result<Policy, AgencyError> {
        store.insert_policy(form).await
    }

    async fn update(
        store: &AgencyStore,
        id: i64,
        form: PolicyForm,
    ) -> Result<Option<Policy>, AgencyError> {
        store.update_policy(id, form).await
    }

    async fn delete(store: &AgencyStore, id: i64) -> Result<bool, AgencyError> {
        store.delete_policy(id).await
    }
}

#[async_trait]
impl AdminResource for Letters {
    const NAME: &'static str = "letters";

    type Row = Letter;
    type Detail = Letter;
    type Form = LetterForm;

    async fn list(store: &AgencyStore) -> Result<Vec<Letter>, AgencyError> {
        store.list_letters().await
    }

    async fn detail(store: &AgencyStore, id: i64) -> Result<Option<Letter>, AgencyError> {
        store.get_letter(id).await
    }

    async fn create(store: &AgencyStore, form: LetterForm) -> Result<Letter, AgencyError> {
        store.insert_letter(form).await
    }

    async fn update(
        store: &AgencyStore,
        id: i64,
        form: LetterForm,
    ) -> Result<Option<Letter>, AgencyError> {
        store.update_letter(id, form).await
    }

    async fn delete(store: &AgencyStore, id: i64) -> Result<bool, AgencyError> {
        store.delete_letter(id).await
    }
}

fn missing<R: AdminResource>(id: i64) -> AgencyError {
    AgencyError::not_found(format!("{} {id}", R::NAME))
}

async fn list_records<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<FieldMap>>, AgencyError> {
    let rows = R::list(&state.store).await?;
    Ok(Json(to_field_maps(&rows)?))
}

async fn show_record<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    RequiredPath(id): RequiredPath<i64>,
) -> Result<Json<FieldMap>, AgencyError> {
    let detail = R::detail(&state.store, id)
        .await?
        .ok_or_else(|| missing::<R>(id))?;
    Ok(Json(detail.as_field_map()?))
}

async fn create_record<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequiredJson(form): RequiredJson<R::Form>,
) -> Result<Response, AgencyError> {
    let row = R::create(&state.store, form).await?;
    info!(resource = R::NAME, admin = %admin.username, "record created");
    Ok((StatusCode::CREATED, Json(row.as_field_map()?)).into_response())
}

async fn update_record<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequiredPath(id): RequiredPath<i64>,
    RequiredJson(form): RequiredJson<R::Form>,
) -> Result<Json<FieldMap>, AgencyError> {
    let row = R::update(&state.store, id, form)
        .await?
        .ok_or_else(|| missing::<R>(id))?;
    info!(resource = R::NAME, id, admin = %admin.username, "record updated");
    Ok(Json(row.as_field_map()?))
}

async fn delete_record<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequiredPath(id): RequiredPath<i64>,
) -> Result<StatusCode, AgencyError> {
    if !R::delete(&state.store, id).await? {
        return Err(missing::<R>(id));
    }
    info!(resource = R::NAME, id, admin = %admin.username, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn resource_routes<R: AdminResource>() -> Router<AppState> {
    Router::new()
        .route(
            &format!("/{}", R::NAME),
            get(list_records::<R>).post(create_record::<R>),
        )
        .route(
            &format!("/{}/{{id}}", R::NAME),
            get(show_record::<R>)
                .put(update_record::<R>)
                .delete(delete_record::<R>),
        )
}

/// Routes mounted under `/admin/api`.
pub fn admin_api_router() -> Router<AppState> {
    Router::new()
        .merge(resource_routes::<Users>())
        .merge(resource_routes::<Contacts>())
        .merge(resource_routes::<Policies>())
        .merge(resource_routes::<Letters>())
}
