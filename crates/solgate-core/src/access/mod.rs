//! Access verification and credential issuance.

mod token;
mod verifier;

pub use token::{
    AccessTokenRecord, IssuedToken, TokenIssuer, TokenValidation, DEFAULT_TOKEN_EXPIRATION_SECS,
};
pub use verifier::{AccessVerification, AccessVerifier, DEFAULT_CACHE_TTL_SECS};
