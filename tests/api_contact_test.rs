//! Integration tests for the contact form endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use mockito::Matcher;
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use crate::test_utils::{
        body_to_string, test_app, test_app_with_config, test_config, unreachable_url,
    };

    fn contact_request(payload: Value) -> Request<Body> {
        Request::builder()
            .uri("/api/contact")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    fn valid_payload() -> Value {
        json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "subject": "Collaboration",
            "message": "Would love to <b>work</b> together."
        })
    }

    async fn error_of(response: axum::response::Response) -> String {
        let body = body_to_string(response.into_body()).await;
        let value: Value = serde_json::from_str(&body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    /// Tests a valid submission is forwarded to the email provider with
    /// escaped fields and a reply-to of the visitor
    #[tokio::test]
    async fn it_sends_the_contact_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer test-email-key")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "from": "Portfolio Contact <noreply@example.com>",
                    "to": ["owner@example.com"],
                    "subject": "Portfolio Contact: Collaboration",
                    "reply_to": "ada@example.com"
                })),
                Matcher::Regex("&lt;b&gt;work&lt;".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":"email-123"}"#)
            .create_async()
            .await;

        let app = test_app_with_config(test_config(&unreachable_url(), &server.url())).await;
        let response = app.oneshot(contact_request(valid_payload())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"success": true, "message": "Email sent successfully"})
        );
        mock.assert_async().await;
    }

    /// Tests missing or blank fields are rejected
    #[tokio::test]
    async fn it_requires_all_fields() {
        let app = test_app().await;
        let response = app
            .clone()
            .oneshot(contact_request(json!({"name": "Ada", "email": "ada@example.com"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "All fields are required");

        let mut payload = valid_payload();
        payload["message"] = json!("");
        let response = app.oneshot(contact_request(payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "All fields are required");
    }

    /// Tests malformed email addresses are rejected
    #[tokio::test]
    async fn it_rejects_invalid_email() {
        let app = test_app().await;
        let mut payload = valid_payload();
        payload["email"] = json!("not-an-email");
        let response = app.oneshot(contact_request(payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "Invalid email format");
    }

    /// Tests over-long fields are rejected
    #[tokio::test]
    async fn it_rejects_long_fields() {
        let app = test_app().await;
        let mut payload = valid_payload();
        payload["message"] = json!("a".repeat(5001));
        let response = app.oneshot(contact_request(payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "Field length exceeds maximum allowed");
    }

    /// Tests a provider failure is reported without its details
    #[tokio::test]
    async fn it_reports_provider_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/emails")
            .with_status(422)
            .with_body(r#"{"message":"domain not verified"}"#)
            .create_async()
            .await;

        let app = test_app_with_config(test_config(&unreachable_url(), &server.url())).await;
        let response = app.oneshot(contact_request(valid_payload())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(response).await, "Failed to send email");
    }

    /// Tests a missing provider key fails without calling the provider
    #[tokio::test]
    async fn it_fails_without_email_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .expect(0)
            .create_async()
            .await;

        let mut config = test_config(&unreachable_url(), &server.url());
        config.email_api_key = None;
        let app = test_app_with_config(config).await;
        let response = app.oneshot(contact_request(valid_payload())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(response).await, "Email service not configured");
        mock.assert_async().await;
    }
}
