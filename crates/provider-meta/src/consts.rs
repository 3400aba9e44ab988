//! Field names, header names and environment variables shared by the provider.

/// Schema field that carries a resource's namespace (and the provider's root namespace).
pub const FIELD_NAMESPACE: &str = "namespace";

/// Request header Vault reads to scope a request to a namespace.
pub const NAMESPACE_HEADER_NAME: &str = "X-Vault-Namespace";

/// Request header carrying the client token.
pub const TOKEN_HEADER_NAME: &str = "X-Vault-Token";

/// Namespace override consulted when importing resources whose state has no namespace.
pub const ENV_VAR_VAULT_NAMESPACE_IMPORT: &str = "TERRAFORM_VAULT_NAMESPACE_IMPORT";

/// Separator between namespace path segments.
pub const PATH_DELIM: char = '/';
