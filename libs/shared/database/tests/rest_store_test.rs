use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{RestStore, Store};
use shared_models::{AppError, NewInvoice, StockLine};

fn store_for(server: &MockServer) -> RestStore {
    let config = AppConfig {
        postgrest_url: server.uri(),
        postgrest_api_key: "test-key".to_string(),
        ..AppConfig::default()
    };
    RestStore::new(&config)
}

#[tokio::test]
async fn select_sends_api_key_and_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.admin@clinic.test"))
        .and(header("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "email": "admin@clinic.test",
            "password_hash": "hash",
            "name": "Admin",
            "phone": null,
            "role": "ADMIN",
            "status": "active",
            "failed_login_attempts": 0,
            "lockout_until": null,
            "joined": "2026-01-01T00:00:00Z"
        }])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let user = store.user_by_email("admin@clinic.test").await.unwrap();
    assert_eq!(user.unwrap().id, 1);
}

#[tokio::test]
async fn missing_row_comes_back_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let user = store.user_by_id(99).await.unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn insert_asks_for_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/invoices"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "id": "INV-48211234", "amount": 350.0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "INV-48211234",
            "clinic_id": 1,
            "patient_id": 2,
            "doctor_id": 3,
            "service": "Consultation",
            "amount": 350.0,
            "status": "Pending",
            "created_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let invoice = store
        .create_invoice(NewInvoice {
            id: "INV-48211234".to_string(),
            clinic_id: 1,
            patient_id: 2,
            doctor_id: Some(3),
            service: "Consultation".to_string(),
            amount: 350.0,
            status: "Pending".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(invoice.status, "Pending");
}

#[tokio::test]
async fn deduct_stock_calls_the_database_function() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/deduct_stock"))
        .and(body_partial_json(json!({ "p_clinic_id": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 5,
            "clinic_id": 1,
            "name": "Amoxicillin",
            "sku": "AMX-500",
            "quantity": 17,
            "unit_price": 12.5,
            "expiry_date": null,
            "created_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let updated = store
        .deduct_stock(
            1,
            &[StockLine {
                inventory_id: 5,
                quantity: 3,
                price: None,
            }],
        )
        .await
        .unwrap();
    assert_eq!(updated[0].quantity, 17);
}

#[tokio::test]
async fn stock_shortfall_surfaces_the_item_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/deduct_stock"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "insufficient stock: Ibuprofen"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .deduct_stock(
            1,
            &[StockLine {
                inventory_id: 9,
                quantity: 50,
                price: None,
            }],
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::InsufficientStock(name) if name == "Ibuprofen");
}

#[tokio::test]
async fn patch_with_no_match_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .update_invoice_status("INV-00000000", "Paid")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}
