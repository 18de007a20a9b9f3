// Password hashing for locally registered accounts (bcrypt).
//
// Both functions are CPU bound; call them from `tokio::task::spawn_blocking`.

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// False for a wrong password and for a stored hash bcrypt cannot parse.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}
