use crate::helpers::spawn_app;
use subscription_registry::store;

#[tokio::test]
async fn subscribe_returns_a_200_for_valid_form_data() {
    // Arrange
    let app = spawn_app().await;
    let body = "name=le%20guin&email=ursula_le_guin%40gmail.com";

    // Act
    let response = app.post_subscriptions(body.into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber() {
    // Arrange
    let app = spawn_app().await;
    let body = "name=le%20guin&email=ursula_le_guin%40gmail.com";

    // Act
    app.post_subscriptions(body.into()).await;

    // Assert
    let saved = app.stored_subscriptions().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "ursula_le_guin@gmail.com");
    assert_eq!(saved[0].1, "le guin");
}

#[tokio::test]
async fn subscribe_returns_the_created_subscription() {
    // Arrange
    let app = spawn_app().await;
    let body = "name=le%20guin&email=ursula_le_guin%40gmail.com";

    // Act
    let response = app.post_subscriptions(body.into()).await;

    // Assert
    let subscription: serde_json::Value = response.json().await.unwrap();
    assert_eq!(subscription["email"], "ursula_le_guin@gmail.com");
    assert_eq!(subscription["name"], "le guin");
    assert!(subscription["id"].as_str().is_some());
    assert!(subscription["subscribed_at"].as_str().is_some());
}

#[tokio::test]
async fn subscribe_returns_a_400_when_data_is_missing() {
    // Arrange
    let app = spawn_app().await;
    let test_cases = vec![
        ("name=le%20guin", "missing the email"),
        ("email=ursula_le_guin%40gmail.com", "missing the name"),
        ("", "missing both name and email"),
    ];

    for (invalid_body, error_message) in test_cases {
        // Act
        let response = app.post_subscriptions(invalid_body.into()).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            // Additional customised error message on test failure
            "The API did not fail with 400 Bad Request when the payload was {}.",
            error_message
        );
    }
}

#[tokio::test]
async fn subscribe_returns_a_400_when_fields_are_present_but_invalid() {
    // Arrange
    let app = spawn_app().await;
    let test_cases = vec![
        ("name=&email=ursula_le_guin%40gmail.com", "empty name"),
        ("name=Ursula&email=", "empty email"),
        ("name=Ursula&email=definitely-not-an-email", "invalid email"),
    ];

    for (body, description) in test_cases {
        // Act
        let response = app.post_subscriptions(body.into()).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
    }
    assert!(app.stored_subscriptions().await.is_empty());
}

#[tokio::test]
async fn subscribing_twice_with_the_same_email_returns_a_409() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let first = app
        .post_subscriptions("name=Alice&email=a%40b.com".into())
        .await;
    let second = app.post_subscriptions("name=Bob&email=a%40b.com".into()).await;

    // Assert
    assert_eq!(200, first.status().as_u16());
    assert_eq!(409, second.status().as_u16());
    let saved = app.stored_subscriptions().await;
    assert_eq!(saved, vec![("a@b.com".to_string(), "Alice".to_string())]);
}

#[tokio::test]
async fn concurrent_subscriptions_with_the_same_email_persist_one_record() {
    // Arrange
    let app = spawn_app().await;
    let attempts = 16;

    // Act
    let handles: Vec<_> = (0..attempts)
        .map(|i| {
            let client = app.api_client.clone();
            let url = format!("{}/subscriptions", &app.address);
            tokio::spawn(async move {
                client
                    .post(&url)
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(format!("name=Subscriber%20{i}&email=a%40b.com"))
                    .send()
                    .await
                    .expect("Failed to execute request.")
                    .status()
                    .as_u16()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    // Assert
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == 409).count(), attempts - 1);
    assert_eq!(app.stored_subscriptions().await.len(), 1);
}

#[tokio::test]
async fn lookup_returns_a_subscription_after_subscribing() {
    // Arrange
    let app = spawn_app().await;
    app.post_subscriptions("name=Alice&email=a%40b.com".into())
        .await
        .error_for_status()
        .unwrap();

    // Act
    let response = app.get_subscription("a@b.com").await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let subscription: serde_json::Value = response.json().await.unwrap();
    assert_eq!(subscription["email"], "a@b.com");
    assert_eq!(subscription["name"], "Alice");
}

#[tokio::test]
async fn lookup_returns_a_404_for_an_unknown_email() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get_subscription("nobody@example.com").await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn lookup_returns_a_404_for_a_malformed_email() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get_subscription("never-subscribed").await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn database_connections_carry_a_statement_timeout() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let timeout = sqlx::query_scalar::<_, String>("SHOW statement_timeout")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to read statement_timeout.");

    // Assert
    assert_eq!(timeout, "3s");
}

#[tokio::test]
async fn migrations_can_be_applied_more_than_once() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let outcome = store::migrate(&app.db_pool).await;

    // Assert
    assert!(outcome.is_ok());
}
