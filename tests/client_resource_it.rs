// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use hydra_reconcile::{
	api::ReqwestAdminApi,
	auth::{AdminCredentials, Secret},
	config::AdminConfig,
	error::Error,
	resource::{ClientAttributes, ClientResource, Resource},
	state::{AttrValue, MemoryResourceData, ResourceData},
	url::Url,
};

fn admin_config(server: &MockServer) -> AdminConfig {
	AdminConfig::builder(
		Url::parse(&server.base_url()).expect("Mock admin URL should parse successfully."),
	)
	.skip_tls_verify(true)
	.build()
	.expect("Mock admin configuration should validate.")
}

fn client_resource(config: &AdminConfig) -> ClientResource {
	let api = ReqwestAdminApi::from_config(config).expect("Admin API should build for tests.");

	ClientResource::new(Arc::new(api))
}

fn declared_client() -> MemoryResourceData {
	let mut state = MemoryResourceData::default();

	state.set(ClientAttributes::NAME, AttrValue::string("billing"));
	state.set(ClientAttributes::SCOPE, AttrValue::string_set(["hydra.clients", "hydra.policies"]));

	state
}

fn server_client(id: &str) -> serde_json::Value {
	json!({
		"client_id": id,
		"client_name": "billing",
		"scope": "hydra.clients hydra.policies",
		"grant_types": ["authorization_code", "refresh_token"],
		"response_types": ["code"],
		"redirect_uris": null,
		"contacts": [""],
		"owner": "",
		"token_endpoint_auth_method": "client_secret_basic",
	})
}

#[tokio::test]
async fn create_records_identifier_secret_and_server_defaults() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/clients").json_body(json!({
				"client_name": "billing",
				"scope": "hydra.clients hydra.policies",
			}));

			let mut body = server_client("generated-id");

			body["client_secret"] = json!("generated-secret");

			then.status(201).header("content-type", "application/json").json_body(body);
		})
		.await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/generated-id");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(server_client("generated-id"));
		})
		.await;
	let mut state = declared_client();
	let id = resource.create(&mut state).await.expect("Client creation should succeed.");

	assert_eq!(id, "generated-id");
	assert_eq!(state.id(), "generated-id");
	assert_eq!(state.get_str(ClientAttributes::CLIENT_SECRET), Some("generated-secret"));
	assert_eq!(state.get_str(ClientAttributes::NAME), Some("billing"));
	assert_eq!(state.get_strings(ClientAttributes::SCOPE), vec![
		"hydra.clients",
		"hydra.policies"
	]);
	assert_eq!(state.get_strings(ClientAttributes::GRANT_TYPES), vec![
		"authorization_code",
		"refresh_token"
	]);
	assert_eq!(
		state.get_str(ClientAttributes::TOKEN_ENDPOINT_AUTH_METHOD),
		Some("client_secret_basic")
	);
	assert!(state.get_strings(ClientAttributes::CONTACTS).is_empty());

	create.assert_async().await;
	read.assert_async().await;
}

#[tokio::test]
async fn invalid_declarations_never_reach_the_server() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/clients");
			then.status(201);
		})
		.await;
	let mut state = declared_client();

	state.set(ClientAttributes::RESPONSE_TYPES, AttrValue::string_set(["code", "ticket"]));

	let err = resource.create(&mut state).await.expect_err("Unknown response types must fail.");

	assert!(matches!(err, Error::Validation(_)));
	assert!(err.to_string().contains("id_token, code, token"));
	assert!(resource.validate(&state).is_err());
	assert_eq!(state.id(), "");

	create.assert_calls_async(0).await;
}

#[tokio::test]
async fn failed_follow_up_read_keeps_the_created_identifier() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/clients");
			then.status(201)
				.header("content-type", "application/json")
				.json_body(server_client("orphan"));
		})
		.await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/orphan");
			then.status(500).body("database unavailable");
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/clients/orphan");
			then.status(204);
		})
		.await;
	let mut state = declared_client();
	let err = resource.create(&mut state).await.expect_err("Follow-up read failure must surface.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(
		err.to_string(),
		"Failed reading client: Unexpected HTTP status code 500 (database unavailable)."
	);
	assert_eq!(state.id(), "orphan");

	create.assert_async().await;
	read.assert_async().await;
	delete.assert_calls_async(0).await;
}

#[tokio::test]
async fn update_accepts_any_2xx_and_rejects_redirects() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let mut update = server
		.mock_async(|when, then| {
			when.method(PUT).path("/clients/c1").json_body(json!({
				"client_id": "c1",
				"client_name": "billing",
				"scope": "hydra.clients hydra.policies",
			}));
			then.status(299);
		})
		.await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/c1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(server_client("c1"));
		})
		.await;
	let mut state = declared_client();

	resource.update("c1", &mut state).await.expect("Status 299 should count as success.");

	update.assert_async().await;
	read.assert_async().await;
	update.delete_async().await;

	let redirect = server
		.mock_async(|when, then| {
			when.method(PUT).path("/clients/c1");
			then.status(300).header("location", "/elsewhere");
		})
		.await;
	let err = resource.update("c1", &mut state).await.expect_err("Status 300 must fail.");

	assert_eq!(err.status(), Some(300));
	assert!(err.to_string().starts_with("Failed updating client: Unexpected HTTP status code 300"));

	redirect.assert_async().await;
	read.assert_calls_async(1).await;
}

#[tokio::test]
async fn read_of_missing_client_reports_not_found_without_touching_state() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/gone");
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"error\":\"Unable to locate the resource\"}");
		})
		.await;
	let mut state = declared_client();

	state.set_id("gone");

	let before = state.clone();
	let err = resource.read("gone", &mut state).await.expect_err("Missing clients must fail.");

	assert!(err.is_not_found());
	assert_eq!(state, before);

	read.assert_async().await;
}

#[tokio::test]
async fn delete_after_delete_surfaces_the_remote_status() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let mut first = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/clients/c1");
			then.status(204);
		})
		.await;

	resource.delete("c1").await.expect("First delete should succeed.");
	first.assert_async().await;
	first.delete_async().await;

	let second = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/clients/c1");
			then.status(404);
		})
		.await;
	let err = resource.delete("c1").await.expect_err("Second delete should fail.");

	assert!(err.is_not_found());
	assert_eq!(err.to_string(), "Failed deleting client: Unexpected HTTP status code 404.");

	second.assert_async().await;
}

#[tokio::test]
async fn configured_credentials_authenticate_every_call_with_one_token() {
	let server = MockServer::start_async().await;
	let token_url = Url::parse(&server.url("/oauth2/token")).expect("Token URL should parse.");
	let config = AdminConfig::builder(
		Url::parse(&server.base_url()).expect("Mock admin URL should parse successfully."),
	)
	.skip_tls_verify(true)
	.credentials(
		AdminCredentials::new("ops", Secret::new("ops-secret"), token_url).with_scope("hydra"),
	)
	.build()
	.expect("Authenticated configuration should validate.");
	let resource = client_resource(&config);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").body_includes("grant_type=client_credentials");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"admin-token\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/c1").header("authorization", "Bearer admin-token");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(server_client("c1"));
		})
		.await;
	let mut state = MemoryResourceData::with_id("c1");

	resource.read("c1", &mut state).await.expect("First authenticated read should succeed.");
	resource.read("c1", &mut state).await.expect("Second authenticated read should succeed.");

	assert_eq!(state.get_str(ClientAttributes::NAME), Some("billing"));

	token.assert_calls_async(1).await;
	read.assert_calls_async(2).await;
}

fn authenticated_config(server: &MockServer) -> AdminConfig {
	let token_url = Url::parse(&server.url("/oauth2/token")).expect("Token URL should parse.");

	AdminConfig::builder(
		Url::parse(&server.base_url()).expect("Mock admin URL should parse successfully."),
	)
	.skip_tls_verify(true)
	.credentials(AdminCredentials::new("ops", Secret::new("ops-secret"), token_url))
	.build()
	.expect("Authenticated configuration should validate.")
}

#[tokio::test]
async fn create_without_response_body_keeps_the_declared_identifier() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/clients").json_body(json!({
				"client_id": "billing-app",
				"client_name": "billing",
				"scope": "hydra.clients hydra.policies",
			}));
			then.status(204);
		})
		.await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/billing-app");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(server_client("billing-app"));
		})
		.await;
	let mut state = declared_client();

	state.set(ClientAttributes::CLIENT_ID, AttrValue::string("billing-app"));

	let id = resource.create(&mut state).await.expect("Body-less creation should succeed.");

	assert_eq!(id, "billing-app");
	assert_eq!(state.id(), "billing-app");
	assert_eq!(state.get_str(ClientAttributes::CLIENT_SECRET), None);

	create.assert_async().await;
	read.assert_async().await;
}

#[tokio::test]
async fn create_without_any_identifier_fails_before_reading() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&admin_config(&server));
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/clients");
			then.status(204);
		})
		.await;
	let mut state = declared_client();
	let err = resource.create(&mut state).await.expect_err("A missing identifier must fail.");

	assert_eq!(state.id(), "");
	assert!(err.to_string().starts_with("Failed creating client"));

	create.assert_async().await;
}

#[tokio::test]
async fn unbounded_token_lifetimes_are_cached_without_expiry() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&authenticated_config(&server));
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"forever\",\"token_type\":\"bearer\",\"expires_in\":9000000000000000000}",
			);
		})
		.await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/c1").header("authorization", "Bearer forever");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(server_client("c1"));
		})
		.await;
	let mut state = MemoryResourceData::with_id("c1");

	resource.read("c1", &mut state).await.expect("First read should succeed.");
	resource.read("c1", &mut state).await.expect("Second read should reuse the token.");

	token.assert_calls_async(1).await;
	read.assert_calls_async(2).await;
}

#[tokio::test]
async fn rejected_bearer_tokens_are_exchanged_again() {
	let server = MockServer::start_async().await;
	let resource = client_resource(&authenticated_config(&server));
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"admin-token\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let mut rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/c1");
			then.status(401).body("{\"error\":\"request_unauthorized\"}");
		})
		.await;
	let mut state = MemoryResourceData::with_id("c1");
	let err = resource.read("c1", &mut state).await.expect_err("401 must surface as an error.");

	assert_eq!(err.status(), Some(401));

	rejected.assert_async().await;
	rejected.delete_async().await;

	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/c1").header("authorization", "Bearer admin-token");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(server_client("c1"));
		})
		.await;

	resource.read("c1", &mut state).await.expect("Read with a fresh token should succeed.");

	assert_eq!(state.get_str(ClientAttributes::NAME), Some("billing"));

	token.assert_calls_async(2).await;
	accepted.assert_async().await;
}
