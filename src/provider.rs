//! Registry mapping host resource type names to their reconcilers.

// self
use crate::{
	_prelude::*,
	api::{AdminApi, ReqwestAdminApi},
	config::AdminConfig,
	error::ConfigError,
	obs::ResourceKind,
	resource::{ClientResource, PolicyResource, Resource},
};

/// Every managed resource type sharing one admin API handle.
#[derive(Clone)]
pub struct Provider {
	resources: BTreeMap<&'static str, Arc<dyn Resource>>,
}
impl Provider {
	/// Registers both reconcilers against `api`.
	pub fn new(api: Arc<dyn AdminApi>) -> Self {
		let client: Arc<dyn Resource> = Arc::new(ClientResource::new(api.clone()));
		let policy: Arc<dyn Resource> = Arc::new(PolicyResource::new(api));

		Self {
			resources: BTreeMap::from([
				(ResourceKind::Client.as_str(), client),
				(ResourceKind::Policy.as_str(), policy),
			]),
		}
	}

	/// Builds the reqwest-backed admin API from `config` and registers the reconcilers.
	pub fn from_config(config: &AdminConfig) -> Result<Self, ConfigError> {
		let api = ReqwestAdminApi::from_config(config)?;

		Ok(Self::new(Arc::new(api)))
	}

	/// Builds the provider from `HYDRA_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_config(&AdminConfig::from_env()?)
	}

	/// Looks up the reconciler for a resource type name such as `hydra_client`.
	pub fn resource(&self, name: &str) -> Option<Arc<dyn Resource>> {
		self.resources.get(name).cloned()
	}

	/// Registered resource type names, sorted.
	pub fn resource_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.resources.keys().copied()
	}
}
impl Debug for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Provider").field("resources", &self.resources.keys()).finish()
	}
}
