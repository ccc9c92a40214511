mod common;

use agency_office::db::models::{LetterForm, PolicyForm};
use agency_office::service::pdf::PdfRenderer;
use axum::http::{StatusCode, header};
use common::{
    FailingRenderer, TestApp, body_bytes, body_json, location, spawn_app, spawn_app_with,
    test_config,
};
use std::sync::Arc;

async fn seed_letter_and_policy(app: &TestApp) -> (i64, i64) {
    let contact_id = app.create_contact("Ann", "Lee", "555-1212").await;
    let letter = app
        .state
        .store
        .insert_letter(LetterForm {
            title: Some("Renewal".into()),
            description: Some("Annual renewal notice".into()),
            template: Some(
                "<p>Dear {{ policy.contact.first }} {{ policy.contact.last }},</p>\
                 <p>Your {{ policy.policy_type }} policy #{{ policy.policy_number }} is due.</p>"
                    .into(),
            ),
        })
        .await
        .unwrap();
    let policy = app
        .state
        .store
        .insert_policy(PolicyForm {
            policy_number: Some(90210),
            policy_type: Some("Auto".into()),
            contact_id: Some(contact_id),
        })
        .await
        .unwrap();
    (letter.id, policy.id)
}

#[tokio::test]
async fn generates_a_pdf_from_the_merged_template() {
    let (app, renderer) = spawn_app().await;
    let (lid, pid) = seed_letter_and_policy(&app).await;
    let mut client = app.signed_in("agent", false).await;

    let resp = client
        .get(&format!("/genreport?lid={lid}&policyId={pid}"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=output.pdf"
    );
    let pdf = body_bytes(resp).await;
    assert!(pdf.starts_with(b"%PDF"));

    let html = renderer.last_html.lock().unwrap().clone().expect("renderer called");
    assert_eq!(
        html,
        "<p>Dear Ann Lee,</p><p>Your Auto policy #90210 is due.</p>"
    );
}

#[tokio::test]
async fn letter_without_a_template_renders_an_empty_document() {
    let (app, renderer) = spawn_app().await;
    let (_, pid) = seed_letter_and_policy(&app).await;
    let blank = app
        .state
        .store
        .insert_letter(LetterForm::default())
        .await
        .unwrap();
    let mut client = app.signed_in("agent", false).await;

    let resp = client
        .get(&format!("/genreport?lid={}&policyId={pid}", blank.id))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(renderer.last_html.lock().unwrap().as_deref(), Some(""));
}

#[tokio::test]
async fn unknown_letter_or_policy_is_not_found() {
    let (app, renderer) = spawn_app().await;
    let (lid, pid) = seed_letter_and_policy(&app).await;
    let mut client = app.signed_in("agent", false).await;

    let resp = client
        .get(&format!("/genreport?lid=9999&policyId={pid}"))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = client
        .get(&format!("/genreport?lid={lid}&policyId=9999"))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(renderer.last_html.lock().unwrap().is_none());
}

#[tokio::test]
async fn missing_or_non_numeric_parameters_are_bad_requests() {
    let (app, _) = spawn_app().await;
    let mut client = app.signed_in("agent", false).await;

    for uri in [
        "/genreport",
        "/genreport?lid=1",
        "/genreport?policyId=1",
        "/genreport?lid=abc&policyId=1",
    ] {
        let resp = client.get(uri).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn engine_failure_is_reported_as_a_server_error() {
    let renderer: Arc<dyn PdfRenderer> = Arc::new(FailingRenderer);
    let app = spawn_app_with(test_config(), renderer).await;
    let (lid, pid) = seed_letter_and_policy(&app).await;
    let mut client = app.signed_in("agent", false).await;

    let resp = client
        .get(&format!("/genreport?lid={lid}&policyId={pid}"))
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "PDF_ENGINE_ERROR");
}

#[tokio::test]
async fn report_generation_requires_a_session() {
    let (app, _) = spawn_app().await;
    let mut client = app.client();
    let resp = client.get("/genreport?lid=1&policyId=1").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/login?next=%2Fgenreport%3Flid%3D1%26policyId%3D1"
    );
}
