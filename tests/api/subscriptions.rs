use sqlx::Row;
use uuid::Uuid;

use crate::helpers::{subscription_body, TestApp};
use subscriptions::domain::subscription::SubscriptionResponse;

#[tokio::test]
async fn create_returns_400_when_body_is_invalid() {
    let test_app = TestApp::spawn_app_without_db().await;
    let user_id = Uuid::new_v4();
    let test_cases = vec![
        (
            subscription_body("Netflix", 400, user_id, "07-2025", Some("05-2025")),
            "end date before start date",
        ),
        (
            subscription_body("   ", 400, user_id, "07-2025", None),
            "blank service name",
        ),
        (
            subscription_body("Netflix", -1, user_id, "07-2025", None),
            "negative price",
        ),
        (
            subscription_body("Netflix", 400, user_id, "2025-07", None),
            "malformed start date",
        ),
        (
            subscription_body("Netflix", 400, user_id, "13-2025", None),
            "out of range month",
        ),
        (
            serde_json::json!({
                "service_name": "Netflix",
                "price": 400,
                "user_id": "not-a-uuid",
                "start_date": "07-2025"
            }),
            "malformed user id",
        ),
        (
            serde_json::json!({
                "service_name": "Netflix",
                "user_id": user_id.to_string(),
                "start_date": "07-2025"
            }),
            "missing price",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_subscription(&invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn malformed_ids_are_rejected_with_400() {
    let test_app = TestApp::spawn_app_without_db().await;
    let body = subscription_body("Netflix", 400, Uuid::new_v4(), "07-2025", None);

    assert_eq!(400, test_app.get_subscription("42").await.status().as_u16());
    assert_eq!(400, test_app.delete_subscription("42").await.status().as_u16());
    assert_eq!(
        400,
        test_app.put_subscription("42", &body).await.status().as_u16()
    );
}

#[tokio::test]
async fn update_returns_400_when_body_is_invalid() {
    let test_app = TestApp::spawn_app_without_db().await;
    let body = subscription_body("Netflix", 400, Uuid::new_v4(), "07-2025", Some("01-2025"));
    let response = test_app
        .put_subscription(&Uuid::new_v4().to_string(), &body)
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn list_rejects_malformed_user_id() {
    let test_app = TestApp::spawn_app_without_db().await;
    let response = test_app.list_subscriptions(&[("user_id", "nope")]).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn create_persists_the_new_subscription() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let user_id = Uuid::new_v4();
    let id = test_app
        .create_subscription(subscription_body(
            " Yandex Plus ",
            400,
            user_id,
            "07-2025",
            None,
        ))
        .await;

    let row = sqlx::query("SELECT service_name, price, user_id, end_month FROM subscriptions WHERE id = $1")
        .bind(Uuid::parse_str(&id).unwrap())
        .fetch_one(&test_app.db_pool)
        .await
        .expect("Failed to fetch saved subscription.");

    assert_eq!(row.get::<String, _>("service_name"), "Yandex Plus");
    assert_eq!(row.get::<i32, _>("price"), 400);
    assert_eq!(row.get::<Uuid, _>("user_id"), user_id);
    assert!(row.get::<Option<chrono::NaiveDate>, _>("end_month").is_none());
}

#[tokio::test]
async fn get_returns_the_subscription() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let user_id = Uuid::new_v4();
    let id = test_app
        .create_subscription(subscription_body(
            "Spotify",
            199,
            user_id,
            "01-2025",
            Some("12-2025"),
        ))
        .await;

    let response = test_app.get_subscription(&id).await;

    assert_eq!(200, response.status().as_u16());

    let subscription: SubscriptionResponse = response.json().await.unwrap();

    assert_eq!(subscription.id.to_string(), id);
    assert_eq!(subscription.service_name, "Spotify");
    assert_eq!(subscription.price, 199);
    assert_eq!(subscription.user_id, user_id);
    assert_eq!(subscription.start_date, "01-2025");
    assert_eq!(subscription.end_date.as_deref(), Some("12-2025"));
}

#[tokio::test]
async fn get_returns_404_for_unknown_id() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let response = test_app
        .get_subscription(&Uuid::new_v4().to_string())
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn update_replaces_every_mutable_field() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let id = test_app
        .create_subscription(subscription_body(
            "Spotify",
            199,
            Uuid::new_v4(),
            "01-2025",
            None,
        ))
        .await;
    let before: SubscriptionResponse = test_app.get_subscription(&id).await.json().await.unwrap();

    // Timestamps have microsecond precision in the store
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let new_user_id = Uuid::new_v4();
    let response = test_app
        .put_subscription(
            &id,
            &subscription_body("Spotify Family", 299, new_user_id, "03-2025", Some("06-2025")),
        )
        .await;

    assert_eq!(204, response.status().as_u16());

    let subscription: SubscriptionResponse =
        test_app.get_subscription(&id).await.json().await.unwrap();

    assert_eq!(subscription.service_name, "Spotify Family");
    assert_eq!(subscription.price, 299);
    assert_eq!(subscription.user_id, new_user_id);
    assert_eq!(subscription.start_date, "03-2025");
    assert_eq!(subscription.end_date.as_deref(), Some("06-2025"));
    assert_eq!(subscription.created_at, before.created_at);
    assert!(subscription.updated_at > before.updated_at);
}

#[tokio::test]
async fn update_and_delete_of_unknown_id_succeed_silently() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let unknown = Uuid::new_v4().to_string();
    let body = subscription_body("Spotify", 199, Uuid::new_v4(), "01-2025", None);

    assert_eq!(204, test_app.put_subscription(&unknown, &body).await.status().as_u16());
    assert_eq!(204, test_app.delete_subscription(&unknown).await.status().as_u16());
}

#[tokio::test]
async fn delete_removes_the_subscription() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let id = test_app
        .create_subscription(subscription_body(
            "Spotify",
            199,
            Uuid::new_v4(),
            "01-2025",
            None,
        ))
        .await;

    assert_eq!(204, test_app.delete_subscription(&id).await.status().as_u16());
    assert_eq!(404, test_app.get_subscription(&id).await.status().as_u16());
}

#[tokio::test]
async fn list_filters_by_user_and_service_independently() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    test_app
        .create_subscription(subscription_body("Netflix", 500, alice, "01-2025", None))
        .await;
    test_app
        .create_subscription(subscription_body("Spotify", 200, alice, "01-2025", None))
        .await;
    test_app
        .create_subscription(subscription_body("Netflix", 500, bob, "02-2025", None))
        .await;

    let by_service: Vec<SubscriptionResponse> = test_app
        .list_subscriptions(&[("service_name", "Netflix")])
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(by_service.len(), 2);
    assert!(by_service.iter().all(|s| s.service_name == "Netflix"));

    let alice_id = alice.to_string();
    let by_user: Vec<SubscriptionResponse> = test_app
        .list_subscriptions(&[("user_id", alice_id.as_str())])
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(by_user.len(), 2);
    assert!(by_user.iter().all(|s| s.user_id == alice));

    let both: Vec<SubscriptionResponse> = test_app
        .list_subscriptions(&[("user_id", alice_id.as_str()), ("service_name", "Netflix")])
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(both.len(), 1);
}

#[tokio::test]
async fn list_returns_newest_first_and_honours_pagination() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let user_id = Uuid::new_v4();

    for service_name in ["First", "Second", "Third"] {
        test_app
            .create_subscription(subscription_body(service_name, 100, user_id, "01-2025", None))
            .await;
    }

    let all: Vec<SubscriptionResponse> = test_app
        .list_subscriptions(&[("limit", "500"), ("offset", "-3")])
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = all.iter().map(|s| s.service_name.as_str()).collect();

    assert_eq!(names, vec!["Third", "Second", "First"]);

    let page: Vec<SubscriptionResponse> = test_app
        .list_subscriptions(&[("limit", "1"), ("offset", "1")])
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].service_name, "Second");
}

#[tokio::test]
async fn long_service_names_are_stored_and_filtered() {
    let Some(test_app) = TestApp::spawn_app().await else {
        return;
    };
    let long_name = "x".repeat(300);
    let unknown_name = "y".repeat(300);

    test_app
        .create_subscription(subscription_body(&long_name, 100, Uuid::new_v4(), "01-2025", None))
        .await;

    let matching: Vec<SubscriptionResponse> = test_app
        .list_subscriptions(&[("service_name", long_name.as_str())])
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].service_name, long_name);

    let response = test_app
        .list_subscriptions(&[("service_name", unknown_name.as_str())])
        .await;

    assert_eq!(200, response.status().as_u16());
    assert!(response.json::<Vec<SubscriptionResponse>>().await.unwrap().is_empty());
}
