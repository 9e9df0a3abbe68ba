mod signature;

pub use signature::{calculate_hmac, generate_shared_secret, verify_signature, SignatureError};
