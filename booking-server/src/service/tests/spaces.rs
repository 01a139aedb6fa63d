//! Spaces API tests

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::{Value, json};

use crate::model::Model;
use crate::service::tests::{app, register, register_at, request, send};

#[actix_web::test]
async fn only_admins_create_spaces() {
    let app = app(Model::test().await.unwrap()).await;
    let admin = register_at(&app, "/api/users/admin", None, "admin").await;
    let user = register(&app, "user1").await;

    let payload = json!({ "spacename": "Room A", "description": "Ground floor" });

    let (status, _) = send(
        &app,
        request(TestRequest::post(), "/api/spaces", None, payload.clone()).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request(
            TestRequest::post(),
            "/api/spaces",
            Some(&user.token),
            payload.clone(),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Not authorized as an admin" }));

    let (status, space) = send(
        &app,
        request(
            TestRequest::post(),
            "/api/spaces",
            Some(&admin.token),
            payload.clone(),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(space["spacename"], "Room A");
    assert_eq!(space["description"], "Ground floor");

    let (status, body) = send(
        &app,
        request(TestRequest::post(), "/api/spaces", Some(&admin.token), payload).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Space already exists" }));

    let (status, body) = send(
        &app,
        request(
            TestRequest::post(),
            "/api/spaces",
            Some(&admin.token),
            json!({ "description": "nameless" }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Please add a space name" }));

    let (status, spaces) = send(
        &app,
        request(TestRequest::get(), "/api/spaces", None, Value::Null).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spaces, json!([space]));
}

#[actix_web::test]
async fn space_with_its_bookings() {
    let app = app(Model::test().await.unwrap()).await;
    let admin = register_at(&app, "/api/users/admin", None, "admin").await;
    let user1 = register(&app, "user1").await;
    let user2 = register(&app, "user2").await;

    let (_, space) = send(
        &app,
        request(
            TestRequest::post(),
            "/api/spaces",
            Some(&admin.token),
            json!({ "spacename": "Room A" }),
        )
        .to_request(),
    )
    .await;
    let space_id = space["_id"].as_str().unwrap();

    for (user, spacename, start) in [
        (&user1, "Room A", "2024-01-01T10:00Z"),
        (&user2, "Room B", "2024-01-01T10:00Z"),
        (&user2, "Room A", "2024-01-01T12:00Z"),
    ] {
        let (status, _) = send(
            &app,
            request(
                TestRequest::post(),
                "/api/bookings",
                Some(&user.token),
                json!({ "spacename": spacename, "bookingstart": start, "bookingend": start }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, fetched) = send(
        &app,
        request(
            TestRequest::get(),
            &format!("/api/spacebookings/{space_id}"),
            None,
            Value::Null,
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, space);

    let (status, bookings) = send(
        &app,
        request(
            TestRequest::get(),
            &format!("/api/bookings/{space_id}"),
            None,
            Value::Null,
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let cards: Vec<_> = bookings
        .as_array()
        .unwrap()
        .iter()
        .map(|booking| {
            (
                booking["user"]["name"].as_str().unwrap(),
                booking["bookingstart"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        cards,
        [
            ("user1", "2024-01-01T10:00:00Z"),
            ("user2", "2024-01-01T12:00:00Z"),
        ]
    );
    assert_eq!(bookings[0]["user"]["_id"], user1.id.as_str());
}

#[actix_web::test]
async fn unknown_space() {
    let app = app(Model::test().await.unwrap()).await;

    for uri in [
        "/api/spacebookings/7b0e1e43-52f4-4b8e-9d6e-3c55f1c1a0a1",
        "/api/bookings/7b0e1e43-52f4-4b8e-9d6e-3c55f1c1a0a1",
    ] {
        let (status, body) = send(
            &app,
            request(TestRequest::get(), uri, None, Value::Null).to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "message": "Space not found" }), "{uri}");
    }
}
