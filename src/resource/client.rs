// self
use crate::{
	_prelude::*,
	api::AdminApi,
	auth::Secret,
	coerce::{self, Enumerated},
	error::{AttributeError, Operation, RemoteError},
	model::{
		ClientScope, GrantType, OAuth2Client, ResponseType, ScopeValidationError,
		TokenEndpointAuthMethod,
	},
	obs::{Action, ResourceKind},
	resource::{self, Resource, ResourceFuture},
	state::{AttrValue, ResourceData},
};

/// Typed view of a client's desired state.
///
/// Optional fields are `None` unless declared with a non-zero value, so they never reach the
/// outbound payload and the server keeps its own defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientAttributes {
	/// Caller-chosen identifier.
	pub client_id: Option<String>,
	/// Display name.
	pub name: String,
	/// Public client flag.
	pub public: Option<bool>,
	/// Caller-chosen secret.
	pub client_secret: Option<Secret>,
	/// Allowed response types.
	pub response_types: Option<Vec<ResponseType>>,
	/// Redirect URIs, in order.
	pub redirect_uris: Option<Vec<String>>,
	/// Requested scope tokens.
	pub scope: ClientScope,
	/// Allowed grant types.
	pub grant_types: Option<Vec<GrantType>>,
	/// Owner.
	pub owner: Option<String>,
	/// Privacy policy URL.
	pub policy_uri: Option<String>,
	/// Logo URL.
	pub logo_uri: Option<String>,
	/// Contact addresses.
	pub contacts: Option<Vec<String>>,
	/// Terms of service URL.
	pub tos_uri: Option<String>,
	/// Client home page URL.
	pub client_uri: Option<String>,
	/// Token endpoint authentication method.
	pub token_endpoint_auth_method: Option<TokenEndpointAuthMethod>,
}
impl ClientAttributes {
	/// Attribute key of the identifier.
	pub const CLIENT_ID: &'static str = "client_id";
	/// Attribute key of the display name.
	pub const NAME: &'static str = "name";
	/// Attribute key of the public flag.
	pub const PUBLIC: &'static str = "public";
	/// Attribute key of the secret.
	pub const CLIENT_SECRET: &'static str = "client_secret";
	/// Attribute key of the response types.
	pub const RESPONSE_TYPES: &'static str = "response_types";
	/// Attribute key of the redirect URIs.
	pub const REDIRECT_URIS: &'static str = "redirect_uris";
	/// Attribute key of the scope list.
	pub const SCOPE: &'static str = "scope";
	/// Attribute key of the grant types.
	pub const GRANT_TYPES: &'static str = "grant_types";
	/// Attribute key of the owner.
	pub const OWNER: &'static str = "owner";
	/// Attribute key of the privacy policy URL.
	pub const POLICY_URI: &'static str = "policy_uri";
	/// Attribute key of the logo URL.
	pub const LOGO_URI: &'static str = "logo_uri";
	/// Attribute key of the contacts.
	pub const CONTACTS: &'static str = "contacts";
	/// Attribute key of the terms of service URL.
	pub const TOS_URI: &'static str = "tos_uri";
	/// Attribute key of the client home page URL.
	pub const CLIENT_URI: &'static str = "client_uri";
	/// Attribute key of the token endpoint authentication method.
	pub const TOKEN_ENDPOINT_AUTH_METHOD: &'static str = "token_endpoint_auth_method";

	/// Reads and validates the desired state.
	pub fn from_state(state: &dyn ResourceData) -> Result<Self> {
		let name = coerce::required_string(state, Self::NAME)?;
		let scope = ClientScope::new(coerce::required_string_list(state, Self::SCOPE)?).map_err(
			|e| AttributeError::InvalidScope {
				attribute: Self::SCOPE,
				token: match e {
					ScopeValidationError::Empty => String::new(),
					ScopeValidationError::ContainsWhitespace { scope } => scope,
				},
			},
		)?;
		let token_endpoint_auth_method =
			match coerce::optional_string(state, Self::TOKEN_ENDPOINT_AUTH_METHOD)? {
				Some(raw) => Some(coerce::parse_enumerated::<TokenEndpointAuthMethod>(
					Self::TOKEN_ENDPOINT_AUTH_METHOD,
					&raw,
				)?),
				None => None,
			};

		Ok(Self {
			client_id: coerce::optional_string(state, Self::CLIENT_ID)?,
			name,
			public: coerce::optional_bool(state, Self::PUBLIC)?,
			client_secret: coerce::optional_string(state, Self::CLIENT_SECRET)?.map(Secret::new),
			response_types: coerce::optional_enum_set(state, Self::RESPONSE_TYPES)?,
			redirect_uris: coerce::optional_string_list(state, Self::REDIRECT_URIS)?,
			scope,
			grant_types: coerce::optional_enum_set(state, Self::GRANT_TYPES)?,
			owner: coerce::optional_string(state, Self::OWNER)?,
			policy_uri: coerce::optional_string(state, Self::POLICY_URI)?,
			logo_uri: coerce::optional_string(state, Self::LOGO_URI)?,
			contacts: coerce::optional_string_list(state, Self::CONTACTS)?,
			tos_uri: coerce::optional_string(state, Self::TOS_URI)?,
			client_uri: coerce::optional_string(state, Self::CLIENT_URI)?,
			token_endpoint_auth_method,
		})
	}

	/// Builds the outbound payload; undeclared fields stay empty and are not serialized.
	pub fn to_payload(&self) -> OAuth2Client {
		OAuth2Client {
			client_id: self.client_id.clone().unwrap_or_default(),
			client_name: self.name.clone(),
			client_secret: self.client_secret.clone(),
			public: self.public,
			redirect_uris: self.redirect_uris.clone().unwrap_or_default(),
			scope: self.scope.clone(),
			response_types: wire_names(self.response_types.as_deref()),
			grant_types: wire_names(self.grant_types.as_deref()),
			owner: self.owner.clone().unwrap_or_default(),
			policy_uri: self.policy_uri.clone().unwrap_or_default(),
			tos_uri: self.tos_uri.clone().unwrap_or_default(),
			client_uri: self.client_uri.clone().unwrap_or_default(),
			logo_uri: self.logo_uri.clone().unwrap_or_default(),
			contacts: self.contacts.clone().unwrap_or_default(),
			token_endpoint_auth_method: self
				.token_endpoint_auth_method
				.map(|method| method.as_str().to_owned())
				.unwrap_or_default(),
		}
	}

	/// Overwrites `state` with the server's view of the client.
	///
	/// The secret is only written when the server returned one; Hydra omits it on reads.
	pub fn store(client: &OAuth2Client, state: &mut dyn ResourceData) {
		if !client.client_id.is_empty() {
			state.set_id(&client.client_id);
			state.set(Self::CLIENT_ID, AttrValue::string(&*client.client_id));
		}
		if let Some(secret) = client.client_secret.as_ref().filter(|secret| !secret.is_empty()) {
			state.set(Self::CLIENT_SECRET, AttrValue::string(secret.expose()));
		}

		state.set(Self::NAME, AttrValue::string(&*client.client_name));
		state.set(Self::SCOPE, AttrValue::string_list(client.scope.iter()));
		state.set(Self::OWNER, AttrValue::string(&*client.owner));
		state.set(Self::PUBLIC, AttrValue::Bool(client.public.unwrap_or(false)));
		state.set(Self::RESPONSE_TYPES, AttrValue::string_set(&client.response_types));
		state.set(Self::GRANT_TYPES, AttrValue::string_set(&client.grant_types));
		state.set(Self::REDIRECT_URIS, AttrValue::string_list(&client.redirect_uris));
		state.set(Self::POLICY_URI, AttrValue::string(&*client.policy_uri));
		state.set(Self::TOS_URI, AttrValue::string(&*client.tos_uri));
		state.set(Self::CLIENT_URI, AttrValue::string(&*client.client_uri));
		state.set(Self::LOGO_URI, AttrValue::string(&*client.logo_uri));
		state.set(
			Self::TOKEN_ENDPOINT_AUTH_METHOD,
			AttrValue::string(&*client.token_endpoint_auth_method),
		);
		state.set(
			Self::CONTACTS,
			AttrValue::string_list(client.contacts.iter().filter(|contact| !contact.is_empty())),
		);
	}
}

/// Reconciler for OAuth 2.0 clients.
#[derive(Clone)]
pub struct ClientResource {
	api: Arc<dyn AdminApi>,
}
impl ClientResource {
	/// Creates a reconciler talking to `api`.
	pub fn new(api: Arc<dyn AdminApi>) -> Self {
		Self { api }
	}

	async fn create_client(&self, state: &mut dyn ResourceData) -> Result<String> {
		const OP: Operation = Operation::CreateClient;

		let payload = ClientAttributes::from_state(&*state)?.to_payload();
		let response = self.api.create_client(&payload).await.map_err(resource::remote(OP))?;

		response.ensure_success().map_err(resource::remote(OP))?;

		let status = response.status;
		let created = response.body.unwrap_or_default();
		let id = if created.client_id.is_empty() { payload.client_id } else { created.client_id };

		if id.is_empty() {
			return Err(Error::remote(OP, RemoteError::MissingId { status }));
		}

		state.set_id(&id);

		if let Some(secret) = created.client_secret.filter(|secret| !secret.is_empty()) {
			state.set(ClientAttributes::CLIENT_SECRET, AttrValue::string(secret.expose()));
		}

		resource::follow_up_read(self, &id, state).await?;

		Ok(id)
	}

	async fn read_client(&self, id: &str, state: &mut dyn ResourceData) -> Result<()> {
		const OP: Operation = Operation::ReadClient;

		let client = self
			.api
			.get_client(id)
			.await
			.map_err(resource::remote(OP))?
			.into_body()
			.map_err(resource::remote(OP))?;

		ClientAttributes::store(&client, state);

		Ok(())
	}

	async fn update_client(&self, id: &str, state: &mut dyn ResourceData) -> Result<()> {
		const OP: Operation = Operation::UpdateClient;

		let mut payload = ClientAttributes::from_state(&*state)?.to_payload();

		id.clone_into(&mut payload.client_id);

		self.api
			.update_client(id, &payload)
			.await
			.map_err(resource::remote(OP))?
			.ensure_success()
			.map_err(resource::remote(OP))?;

		resource::follow_up_read(self, id, state).await
	}

	async fn delete_client(&self, id: &str) -> Result<()> {
		const OP: Operation = Operation::DeleteClient;

		self.api
			.delete_client(id)
			.await
			.map_err(resource::remote(OP))?
			.ensure_success()
			.map_err(resource::remote(OP))?;

		Ok(())
	}
}
impl Resource for ClientResource {
	fn kind(&self) -> ResourceKind {
		ResourceKind::Client
	}

	fn validate(&self, state: &dyn ResourceData) -> Result<()> {
		ClientAttributes::from_state(state).map(drop)
	}

	fn create<'a>(&'a self, state: &'a mut dyn ResourceData) -> ResourceFuture<'a, String> {
		resource::observe(ResourceKind::Client, Action::Create, self.create_client(state))
	}

	fn read<'a>(
		&'a self,
		id: &'a str,
		state: &'a mut dyn ResourceData,
	) -> ResourceFuture<'a, ()> {
		resource::observe(ResourceKind::Client, Action::Read, self.read_client(id, state))
	}

	fn update<'a>(
		&'a self,
		id: &'a str,
		state: &'a mut dyn ResourceData,
	) -> ResourceFuture<'a, ()> {
		resource::observe(ResourceKind::Client, Action::Update, self.update_client(id, state))
	}

	fn delete<'a>(&'a self, id: &'a str) -> ResourceFuture<'a, ()> {
		resource::observe(ResourceKind::Client, Action::Delete, self.delete_client(id))
	}
}

fn wire_names<E>(values: Option<&[E]>) -> Vec<String>
where
	E: Enumerated,
{
	values.unwrap_or_default().iter().map(|value| value.as_str().to_owned()).collect()
}
