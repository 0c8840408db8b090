//! Profile endpoint integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;
use telecare_accounts::ProfileStore;
use telecare_llm::ScriptedLlmService;

use crate::common::{anonymous_request, authed_request, parse_body, TestApp};

#[tokio::test]
async fn test_get_own_profile() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();

    let resp = app
        .send(authed_request(Method::GET, "/v1/users/me", &patient.token, None))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["id"], patient.id().to_string());
    assert_eq!(body["account_type"], "patient");
    assert_eq!(body["allergies"], json!([]));
    assert!(body["date_of_birth"].is_null());
}

#[tokio::test]
async fn test_profile_requires_authentication() {
    let app = TestApp::new(ScriptedLlmService::new());
    let resp = app
        .send(anonymous_request(Method::GET, "/v1/users/me", None))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patient_updates_medical_profile() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();

    let resp = app
        .send(authed_request(
            Method::PATCH,
            "/v1/users/me",
            &patient.token,
            Some(json!({
                "gender": "female",
                "date_of_birth": "1992-03-14",
                "medications": ["Levothyroxine", " Levothyroxine ", ""],
                "allergies": ["Penicillin"]
            })),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["gender"], "female");
    assert_eq!(body["date_of_birth"], "1992-03-14");
    assert_eq!(body["medications"], json!(["Levothyroxine"]));
    assert_eq!(body["allergies"], json!(["Penicillin"]));

    // Omitted fields are left alone
    let resp = app
        .send(authed_request(
            Method::PATCH,
            "/v1/users/me",
            &patient.token,
            Some(json!({"medical_history": ["Hypothyroidism"]})),
        ))
        .await;
    let body = parse_body(resp).await;
    assert_eq!(body["allergies"], json!(["Penicillin"]));
    assert_eq!(body["medical_history"], json!(["Hypothyroidism"]));
}

#[tokio::test]
async fn test_patient_cannot_set_license_fields() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();

    let resp = app
        .send(authed_request(
            Method::PATCH,
            "/v1/users/me",
            &patient.token,
            Some(json!({"specialization": "Cardiology"})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = app.profiles.find_profile(patient.id()).await.unwrap().unwrap();
    assert!(stored.specialization.is_none());
}

#[tokio::test]
async fn test_unknown_and_invalid_fields_rejected() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();

    for body in [
        json!({"dateOfBirth": "1990-01-01"}),
        json!({"gender": "unknown"}),
        json!({"date_of_birth": "2999-01-01"}),
    ] {
        let resp = app
            .send(authed_request(
                Method::PATCH,
                "/v1/users/me",
                &patient.token,
                Some(body),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_doctor_license_change_revokes_verification() {
    let app = TestApp::new(ScriptedLlmService::new());
    let doctor = app.doctor();

    let resp = app
        .send(authed_request(
            Method::PATCH,
            "/v1/users/me",
            &doctor.token,
            Some(json!({
                "medical_license_number": "CA-55821",
                "license_state": "CA",
                "specialization": "Dermatology"
            })),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["account_type"], "doctor");
    assert_eq!(body["specialization"], "Dermatology");
    assert_eq!(body["verified"], false);

    let resp = app
        .send(authed_request(
            Method::PATCH,
            "/v1/users/me",
            &doctor.token,
            Some(json!({"allergies": ["Dust"]})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
