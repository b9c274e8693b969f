use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

// m=64MiB, t=2 iterations, p=1 parallelism: bounds login latency under load
// while staying expensive for offline cracking.
fn get_argon2() -> Argon2<'static> {
    let params = Params::new(64 * 1024, 2, 1, None).unwrap();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = get_argon2();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(get_argon2()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Burns the same hashing cost as a real verification. Used on the
/// user-not-found login path so it cannot be told apart from a wrong
/// password by timing.
pub fn verify_dummy(password: &str) {
    let salt =
        SaltString::from_b64("c2VjdXJlYXV0aA").unwrap_or_else(|_| SaltString::generate(&mut OsRng));
    let _ = get_argon2().hash_password(password.as_bytes(), &salt);
}
