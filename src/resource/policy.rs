// self
use crate::{
	_prelude::*,
	api::AdminApi,
	coerce::{self, Enumerated},
	condition::{ConditionDeclaration, Conditions},
	error::{AttributeError, Operation, RemoteError},
	model::{Effect, Policy},
	obs::{Action, ResourceKind},
	resource::{self, Resource, ResourceFuture},
	state::{AttrValue, ResourceData},
};

/// Typed view of a policy's desired state.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyAttributes {
	/// Caller-chosen identifier.
	pub policy_id: Option<String>,
	/// Free-form description.
	pub description: Option<String>,
	/// Subjects, in order.
	pub subjects: Vec<String>,
	/// Resources, in order.
	pub resources: Vec<String>,
	/// Actions, in order.
	pub actions: Vec<String>,
	/// Allow or deny.
	pub effect: Effect,
	/// Declared conditions.
	pub conditions: Vec<ConditionDeclaration>,
}
impl PolicyAttributes {
	/// Attribute key of the identifier.
	pub const POLICY_ID: &'static str = "policy_id";
	/// Attribute key of the description.
	pub const DESCRIPTION: &'static str = "description";
	/// Attribute key of the subjects.
	pub const SUBJECTS: &'static str = "subjects";
	/// Attribute key of the resources.
	pub const RESOURCES: &'static str = "resources";
	/// Attribute key of the actions.
	pub const ACTIONS: &'static str = "actions";
	/// Attribute key of the effect.
	pub const EFFECT: &'static str = "effect";
	/// Attribute key of the condition set.
	pub const CONDITION: &'static str = "condition";

	/// Reads and validates the desired state.
	///
	/// The effect is checked first so an invalid value is reported even when other fields
	/// are also wrong.
	pub fn from_state(state: &dyn ResourceData) -> Result<Self> {
		let effect = coerce::required_string(state, Self::EFFECT)?;
		let effect = coerce::parse_enumerated::<Effect>(Self::EFFECT, &effect)?;
		let conditions = match state.get_ok(Self::CONDITION) {
			None => Vec::new(),
			Some(value) => value
				.as_elements()
				.ok_or_else(|| AttributeError::UnexpectedKind {
					attribute: Self::CONDITION.to_owned(),
					expected: "a set of condition records",
					found: value.kind(),
				})?
				.iter()
				.map(|item| ConditionDeclaration::from_attr(Self::CONDITION, item))
				.collect::<Result<Vec<_>, _>>()?,
		};

		Ok(Self {
			policy_id: coerce::optional_string(state, Self::POLICY_ID)?,
			description: coerce::optional_string(state, Self::DESCRIPTION)?,
			subjects: coerce::required_string_list(state, Self::SUBJECTS)?,
			resources: coerce::required_string_list(state, Self::RESOURCES)?,
			actions: coerce::required_string_list(state, Self::ACTIONS)?,
			effect,
			conditions,
		})
	}

	/// Builds the outbound payload; conditions are rebuilt from scratch every time.
	pub fn to_payload(&self) -> Result<Policy> {
		Ok(Policy {
			id: self.policy_id.clone().unwrap_or_default(),
			description: self.description.clone().unwrap_or_default(),
			subjects: self.subjects.clone(),
			effect: self.effect,
			resources: self.resources.clone(),
			actions: self.actions.clone(),
			conditions: Conditions::from_declarations(&self.conditions)?,
		})
	}

	/// Overwrites `state` with the server's view of the policy.
	pub fn store(policy: &Policy, state: &mut dyn ResourceData) -> Result<()> {
		let conditions = policy
			.conditions
			.to_declarations()?
			.iter()
			.map(ConditionDeclaration::to_attr)
			.collect::<Vec<_>>();

		if !policy.id.is_empty() {
			state.set_id(&policy.id);
			state.set(Self::POLICY_ID, AttrValue::string(&*policy.id));
		}

		state.set(Self::DESCRIPTION, AttrValue::string(&*policy.description));
		state.set(Self::SUBJECTS, AttrValue::string_list(&policy.subjects));
		state.set(Self::EFFECT, AttrValue::string(policy.effect.as_str()));
		state.set(Self::RESOURCES, AttrValue::string_list(&policy.resources));
		state.set(Self::ACTIONS, AttrValue::string_list(&policy.actions));
		state.set(Self::CONDITION, AttrValue::set(conditions));

		Ok(())
	}
}

/// Reconciler for access-control policies.
#[derive(Clone)]
pub struct PolicyResource {
	api: Arc<dyn AdminApi>,
}
impl PolicyResource {
	/// Creates a reconciler talking to `api`.
	pub fn new(api: Arc<dyn AdminApi>) -> Self {
		Self { api }
	}

	async fn create_policy(&self, state: &mut dyn ResourceData) -> Result<String> {
		const OP: Operation = Operation::CreatePolicy;

		let payload = PolicyAttributes::from_state(&*state)?.to_payload()?;
		let response = self.api.create_policy(&payload).await.map_err(resource::remote(OP))?;

		response.ensure_success().map_err(resource::remote(OP))?;

		let id = response
			.body
			.map(|created| created.id)
			.filter(|id| !id.is_empty())
			.unwrap_or(payload.id);

		if id.is_empty() {
			return Err(Error::remote(OP, RemoteError::MissingId { status: response.status }));
		}

		state.set_id(&id);

		resource::follow_up_read(self, &id, state).await?;

		Ok(id)
	}

	async fn read_policy(&self, id: &str, state: &mut dyn ResourceData) -> Result<()> {
		const OP: Operation = Operation::ReadPolicy;

		let policy = self
			.api
			.get_policy(id)
			.await
			.map_err(resource::remote(OP))?
			.into_body()
			.map_err(resource::remote(OP))?;

		PolicyAttributes::store(&policy, state)
	}

	async fn update_policy(&self, id: &str, state: &mut dyn ResourceData) -> Result<()> {
		const OP: Operation = Operation::UpdatePolicy;

		let mut payload = PolicyAttributes::from_state(&*state)?.to_payload()?;

		id.clone_into(&mut payload.id);

		self.api
			.update_policy(&payload)
			.await
			.map_err(resource::remote(OP))?
			.ensure_success()
			.map_err(resource::remote(OP))?;

		resource::follow_up_read(self, id, state).await
	}

	async fn delete_policy(&self, id: &str) -> Result<()> {
		const OP: Operation = Operation::DeletePolicy;

		self.api
			.delete_policy(id)
			.await
			.map_err(resource::remote(OP))?
			.ensure_success()
			.map_err(resource::remote(OP))?;

		Ok(())
	}
}
impl Resource for PolicyResource {
	fn kind(&self) -> ResourceKind {
		ResourceKind::Policy
	}

	fn validate(&self, state: &dyn ResourceData) -> Result<()> {
		PolicyAttributes::from_state(state)?.to_payload().map(drop)
	}

	fn create<'a>(&'a self, state: &'a mut dyn ResourceData) -> ResourceFuture<'a, String> {
		resource::observe(ResourceKind::Policy, Action::Create, self.create_policy(state))
	}

	fn read<'a>(
		&'a self,
		id: &'a str,
		state: &'a mut dyn ResourceData,
	) -> ResourceFuture<'a, ()> {
		resource::observe(ResourceKind::Policy, Action::Read, self.read_policy(id, state))
	}

	fn update<'a>(
		&'a self,
		id: &'a str,
		state: &'a mut dyn ResourceData,
	) -> ResourceFuture<'a, ()> {
		resource::observe(ResourceKind::Policy, Action::Update, self.update_policy(id, state))
	}

	fn delete<'a>(&'a self, id: &'a str) -> ResourceFuture<'a, ()> {
		resource::observe(ResourceKind::Policy, Action::Delete, self.delete_policy(id))
	}
}
