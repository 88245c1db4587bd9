// self
use crate::{_prelude::*, coerce::Enumerated};

macro_rules! def_enumerated {
	($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+ }) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
		pub enum $name {
			$(
				$(#[$vmeta])*
				#[serde(rename = $wire)]
				$variant,
			)+
		}
		impl Enumerated for $name {
			const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

			fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $wire,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(Enumerated::as_str(*self))
			}
		}
	};
}

def_enumerated! {
	/// OAuth 2.0 grant types a client may use.
	GrantType {
		/// Implicit grant.
		Implicit => "implicit",
		/// Refresh Token grant for long-lived sessions.
		RefreshToken => "refresh_token",
		/// Authorization Code grant.
		AuthorizationCode => "authorization_code",
		/// Resource Owner Password Credentials grant.
		Password => "password",
		/// Client Credentials grant for app-only tokens.
		ClientCredentials => "client_credentials",
	}
}

def_enumerated! {
	/// OAuth 2.0 / OpenID Connect response types a client may request.
	ResponseType {
		/// OpenID Connect ID token.
		IdToken => "id_token",
		/// Authorization code.
		Code => "code",
		/// Access token (implicit flow).
		Token => "token",
	}
}

def_enumerated! {
	/// Client authentication modes for the token endpoint.
	TokenEndpointAuthMethod {
		/// Form POST body parameters for `client_id`/`client_secret`.
		ClientSecretPost => "client_secret_post",
		/// HTTP Basic with `client_id`/`client_secret`.
		ClientSecretBasic => "client_secret_basic",
		/// Signed JWT assertion.
		PrivateKeyJwt => "private_key_jwt",
		/// Public clients without client authentication.
		None => "none",
	}
}

def_enumerated! {
	/// Outcome of a policy whose subjects, resources, actions, and conditions match.
	Effect {
		/// Grant the request.
		Allow => "allow",
		/// Refuse the request.
		Deny => "deny",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::coerce::enumeration_keys;

	#[test]
	fn variants_render_in_declaration_order() {
		assert_eq!(enumeration_keys::<ResponseType>(), vec!["id_token", "code", "token"]);
		assert_eq!(enumeration_keys::<GrantType>(), vec![
			"implicit",
			"refresh_token",
			"authorization_code",
			"password",
			"client_credentials",
		]);
		assert_eq!(enumeration_keys::<TokenEndpointAuthMethod>().len(), 4);
	}

	#[test]
	fn serde_uses_wire_names() {
		let payload = serde_json::to_string(&[GrantType::ClientCredentials, GrantType::Implicit])
			.expect("Grant types should serialize.");

		assert_eq!(payload, r#"["client_credentials","implicit"]"#);
		assert_eq!(
			serde_json::from_str::<TokenEndpointAuthMethod>("\"none\"")
				.expect("`none` should deserialize."),
			TokenEndpointAuthMethod::None,
		);
		assert_eq!(Effect::lookup("deny"), Some(Effect::Deny));
		assert_eq!(Effect::lookup("Deny"), None);
		assert_eq!(Effect::Allow.to_string(), "allow");
	}
}
