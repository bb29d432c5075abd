//! Credential handling: bcrypt password hashing for admin accounts and
//! constant-time comparison for the migration secret.

use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header carrying the migration secret.
pub const MIGRATE_SECRET_HEADER: &str = "x-migrate-secret";

/// Cost factor matching the hashes already present in existing data files.
const BCRYPT_COST: u32 = 10;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Check a password against a stored hash. Malformed hashes verify as false.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    a_bytes.ct_eq(b_bytes).into()
}
