//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all promo-server endpoints.
//!
//! When API routes or request formats change, update only this file.
#![allow(dead_code)] // Not every test binary uses every endpoint

use super::constants::*;
use reqwest::multipart;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use one of the `authenticated_*` constructors instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the seeded influencer
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_influencer(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(INFLUENCER_USER, INFLUENCER_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Influencer authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// Creates a client pre-authenticated as the seeded collaborator
    pub async fn authenticated_collaborator(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(COLLABORATOR_USER, COLLABORATOR_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Collaborator authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// Creates a client pre-authenticated as the seeded admin
    ///
    /// Use this for testing admin-only endpoints.
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.admin_login(ADMIN_USER, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/signup
    pub async fn signup(&self, email: &str, password: &str, role: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/signup", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
                "role": role,
            }))
            .send()
            .await
            .expect("Signup request failed")
    }

    /// POST /v1/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /v1/auth/admin-login
    pub async fn admin_login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/admin-login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Admin login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /v1/auth/session
    pub async fn get_session(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/session", self.base_url))
            .send()
            .await
            .expect("Get session request failed")
    }

    /// PUT /v1/auth/password
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Response {
        self.client
            .put(format!("{}/v1/auth/password", self.base_url))
            .json(&json!({
                "old_password": old_password,
                "new_password": new_password,
            }))
            .send()
            .await
            .expect("Change password request failed")
    }

    // ========================================================================
    // Profile Endpoints
    // ========================================================================

    fn profile_form(fields: &[(&str, &str)], photo: Option<&[u8]>) -> multipart::Form {
        let mut form = multipart::Form::new();
        for (key, value) in fields {
            form = form.text(key.to_string(), value.to_string());
        }
        if let Some(bytes) = photo {
            let part = multipart::Part::bytes(bytes.to_vec())
                .file_name("photo.png")
                .mime_str("image/png")
                .expect("Invalid mime type");
            form = form.part("photo", part);
        }
        form
    }

    /// POST /v1/profile/influencer (multipart)
    pub async fn post_influencer_profile(
        &self,
        fields: &[(&str, &str)],
        photo: Option<&[u8]>,
    ) -> Response {
        self.client
            .post(format!("{}/v1/profile/influencer", self.base_url))
            .multipart(Self::profile_form(fields, photo))
            .send()
            .await
            .expect("Post influencer profile request failed")
    }

    /// POST /v1/profile/collaborator (multipart)
    pub async fn post_collaborator_profile(
        &self,
        fields: &[(&str, &str)],
        photo: Option<&[u8]>,
    ) -> Response {
        self.client
            .post(format!("{}/v1/profile/collaborator", self.base_url))
            .multipart(Self::profile_form(fields, photo))
            .send()
            .await
            .expect("Post collaborator profile request failed")
    }

    /// GET /v1/profile/{email}
    pub async fn get_profile(&self, email: &str) -> Response {
        self.client
            .get(format!("{}/v1/profile/{}", self.base_url, email))
            .send()
            .await
            .expect("Get profile request failed")
    }

    // ========================================================================
    // Event Endpoints
    // ========================================================================

    /// POST /v1/events
    pub async fn post_event(
        &self,
        name: &str,
        date: &str,
        time: &str,
        city: &str,
        venue: &str,
    ) -> Response {
        self.client
            .post(format!("{}/v1/events", self.base_url))
            .json(&json!({
                "name": name,
                "date": date,
                "time": time,
                "city": city,
                "venue": venue,
            }))
            .send()
            .await
            .expect("Post event request failed")
    }

    /// GET /v1/events
    pub async fn get_events(&self) -> Response {
        self.client
            .get(format!("{}/v1/events", self.base_url))
            .send()
            .await
            .expect("Get events request failed")
    }

    /// DELETE /v1/events/{id}
    pub async fn delete_event(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/v1/events/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete event request failed")
    }

    // ========================================================================
    // Admin Endpoints
    // ========================================================================

    /// GET /v1/admin/users
    pub async fn admin_users(&self) -> Response {
        self.client
            .get(format!("{}/v1/admin/users", self.base_url))
            .send()
            .await
            .expect("Admin users request failed")
    }

    /// DELETE /v1/admin/users/{email}
    pub async fn admin_delete_user(&self, email: &str) -> Response {
        self.client
            .delete(format!("{}/v1/admin/users/{}", self.base_url, email))
            .send()
            .await
            .expect("Admin delete user request failed")
    }

    /// PUT /v1/admin/users/{email}/status
    pub async fn admin_set_user_status(&self, email: &str, enabled: bool) -> Response {
        self.client
            .put(format!("{}/v1/admin/users/{}/status", self.base_url, email))
            .json(&json!({ "enabled": enabled }))
            .send()
            .await
            .expect("Admin set user status request failed")
    }

    /// GET /v1/admin/influencer-profiles
    pub async fn admin_influencer_profiles(&self) -> Response {
        self.client
            .get(format!("{}/v1/admin/influencer-profiles", self.base_url))
            .send()
            .await
            .expect("Admin influencer profiles request failed")
    }

    // ========================================================================
    // Find Endpoints (collaborator)
    // ========================================================================

    /// GET /v1/find/influencers with query criteria
    pub async fn find_influencers(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}/v1/find/influencers", self.base_url))
            .query(query)
            .send()
            .await
            .expect("Find influencers request failed")
    }

    /// GET /v1/find/cities?field=...
    pub async fn find_cities(&self, field: &str) -> Response {
        self.client
            .get(format!("{}/v1/find/cities", self.base_url))
            .query(&[("field", field)])
            .send()
            .await
            .expect("Find cities request failed")
    }

    /// POST /v1/find/contact
    pub async fn contact_influencer(&self, influencer_email: &str, message: &str) -> Response {
        self.client
            .post(format!("{}/v1/find/contact", self.base_url))
            .json(&json!({
                "influencer_email": influencer_email,
                "message": message,
            }))
            .send()
            .await
            .expect("Contact influencer request failed")
    }

    // ========================================================================
    // Media Endpoints
    // ========================================================================

    /// GET /v1/media/{folder}/{name} where `media_ref` is "folder/name"
    pub async fn get_media(&self, media_ref: &str) -> Response {
        self.client
            .get(format!("{}/v1/media/{}", self.base_url, media_ref))
            .send()
            .await
            .expect("Get media request failed")
    }
}
