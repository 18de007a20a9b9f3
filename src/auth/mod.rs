// auth - bearer token verification
//
// One `TokenVerifier` interface, three strategies picked by `AuthMode`:
//   self_issued  shared-secret access/refresh tokens minted by this service
//   remote       identity-provider tokens checked against its cached key set
//   unverified   signature-less decode, explicit local development mode only

pub mod claims;
pub mod error;
pub mod jwks;
pub mod password;
pub mod remote;
pub mod self_issued;
pub mod unverified;
pub mod verifier;

pub use claims::{Claims, TokenType};
pub use error::AuthError;
pub use jwks::{HttpKeySetSource, Jwk, JwkSet, KeySetCache, KeySetSource};
pub use remote::RemoteVerifier;
pub use self_issued::SelfIssuedTokens;
pub use unverified::UnverifiedClaimsDecoder;
pub use verifier::{Authenticator, TokenVerifier};
