//! Password hashing and verification
//!
//! Passwords are stored as a self-describing string of four `$`-separated
//! fields:
//!
//! ```text
//! pbkdf2_sha256$<iterations>$<salt hex>$<derived key hex>
//! ```
//!
//! The iteration count travels with each hash, so raising the default only
//! affects newly hashed passwords; older hashes keep verifying at the count
//! they were created with.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use super::timing::constant_time_eq;

/// Algorithm tag written as the first field of every hash string
pub const PASSWORD_ALGORITHM: &str = "pbkdf2_sha256";

/// PBKDF2 iteration count used for new hashes
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Stored hashes claiming more rounds than this are treated as corrupt
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Length of the random salt in bytes
const SALT_BYTES: usize = 16;

/// Length of the derived key in bytes
const KEY_BYTES: usize = 32;

/// Derives and verifies salted PBKDF2-HMAC-SHA256 password hashes
///
/// Hashing is deliberately slow. Async callers should run [`hash`] and
/// [`verify`] on a blocking thread (`tokio::task::spawn_blocking`).
///
/// [`hash`]: PasswordHasher::hash
/// [`verify`]: PasswordHasher::verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Create a hasher using [`DEFAULT_ITERATIONS`]
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Create a hasher with a custom iteration count (clamped to `1..=MAX_ITERATIONS`)
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.clamp(1, MAX_ITERATIONS),
        }
    }

    /// Iteration count used for new hashes
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a password with a fresh random salt
    ///
    /// The whole password is fed to PBKDF2; nothing is truncated.
    ///
    /// # Example
    ///
    /// ```
    /// use zodiac_admin::auth::password::PasswordHasher;
    ///
    /// let hasher = PasswordHasher::with_iterations(1_000);
    /// let stored = hasher.hash("hunter2");
    /// assert!(stored.starts_with("pbkdf2_sha256$1000$"));
    /// assert!(hasher.verify("hunter2", &stored));
    /// ```
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut salt);

        let key = derive_key(password.as_bytes(), &salt, self.iterations);

        format!(
            "{}${}${}${}",
            PASSWORD_ALGORITHM,
            self.iterations,
            hex::encode(salt),
            hex::encode(key)
        )
    }

    /// Verify a password against a stored hash string
    ///
    /// Uses the iteration count and salt recorded in `stored`, not this
    /// hasher's own count.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        verify_password(password, stored)
    }
}

/// Hash a password with the default iteration count
pub fn hash_password(password: &str) -> String {
    PasswordHasher::new().hash(password)
}

/// Verify a password against a stored hash string
///
/// Total over arbitrary input: an unknown algorithm tag, a wrong field count,
/// a non-numeric or out-of-range iteration count, or bad hex all yield `false`.
///
/// # Example
///
/// ```
/// use zodiac_admin::auth::password::verify_password;
///
/// assert!(!verify_password("anything", "garbage"));
/// assert!(!verify_password("anything", ""));
/// ```
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some(parsed) = StoredHash::parse(stored) else {
        return false;
    };

    let derived = derive_key(password.as_bytes(), &parsed.salt, parsed.iterations);
    constant_time_eq(&derived, &parsed.digest)
}

fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_BYTES] {
    let mut key = [0u8; KEY_BYTES];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

/// Decoded fields of a stored hash string
#[derive(Debug)]
struct StoredHash {
    iterations: u32,
    salt: Vec<u8>,
    digest: Vec<u8>,
}

impl StoredHash {
    fn parse(stored: &str) -> Option<Self> {
        let mut fields = stored.split('$');
        let algorithm = fields.next()?;
        let iterations = fields.next()?;
        let salt = fields.next()?;
        let digest = fields.next()?;

        if fields.next().is_some() || algorithm != PASSWORD_ALGORITHM {
            return None;
        }

        let iterations = iterations
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_ITERATIONS).contains(n))?;
        let salt = hex::decode(salt).ok().filter(|s| !s.is_empty())?;
        let digest = hex::decode(digest).ok().filter(|d| !d.is_empty())?;

        Some(Self {
            iterations,
            salt,
            digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_iterations(1_000)
    }

    #[test]
    fn test_hash_has_four_fields() {
        let stored = fast_hasher().hash("hunter2");
        let fields: Vec<&str> = stored.split('$').collect();

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], PASSWORD_ALGORITHM);
        assert_eq!(fields[1], "1000");
        assert_eq!(fields[2].len(), SALT_BYTES * 2);
        assert_eq!(fields[3].len(), KEY_BYTES * 2);
        assert!(fields[2]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(fields[3]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_default_hasher_uses_100k_iterations() {
        let hasher = PasswordHasher::new();
        assert_eq!(hasher.iterations(), 100_000);

        let stored = hash_password("correct horse");
        assert!(stored.starts_with("pbkdf2_sha256$100000$"));
        assert!(verify_password("correct horse", &stored));
    }

    #[test]
    fn test_verify_round_trip() {
        let hasher = fast_hasher();
        let stored = hasher.hash("hunter2");

        assert!(hasher.verify("hunter2", &stored));
        assert!(!hasher.verify("hunter3", &stored));
        assert!(!hasher.verify("", &stored));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash("hunter2");
        let second = hasher.hash("hunter2");

        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
    }

    #[test]
    fn test_verify_uses_stored_iteration_count() {
        let old = PasswordHasher::with_iterations(500).hash("legacy");
        let current = PasswordHasher::with_iterations(2_000);

        assert!(current.verify("legacy", &old));
    }

    #[test]
    fn test_long_password_is_not_truncated() {
        let hasher = fast_hasher();
        let long = "x".repeat(500);
        let stored = hasher.hash(&long);

        assert!(hasher.verify(&long, &stored));
        assert!(!hasher.verify(&"x".repeat(499), &stored));
        assert!(!hasher.verify(&format!("{}y", long), &stored));
    }

    #[test]
    fn test_unicode_password() {
        let hasher = fast_hasher();
        let stored = hasher.hash("♈ aries ☉ sun");

        assert!(hasher.verify("♈ aries ☉ sun", &stored));
        assert!(!hasher.verify("♉ aries ☉ sun", &stored));
    }

    #[test]
    fn test_malformed_hashes_return_false() {
        let good = fast_hasher().hash("pw");
        let fields: Vec<&str> = good.split('$').collect();

        let cases = vec![
            "garbage".to_string(),
            String::new(),
            "$$$".to_string(),
            format!("bcrypt${}${}${}", fields[1], fields[2], fields[3]),
            format!("{}$abc${}${}", fields[0], fields[2], fields[3]),
            format!("{}$0${}${}", fields[0], fields[2], fields[3]),
            format!("{}$-5${}${}", fields[0], fields[2], fields[3]),
            format!("{}$99999999999${}${}", fields[0], fields[2], fields[3]),
            format!("{}${}$zz${}", fields[0], fields[1], fields[3]),
            format!("{}${}${}$not-hex", fields[0], fields[1], fields[2]),
            format!("{}${}$${}", fields[0], fields[1], fields[3]),
            format!("{}${}${}", fields[0], fields[1], fields[2]),
            format!("{}$extra", good),
        ];

        for stored in cases {
            assert!(
                !verify_password("pw", &stored),
                "expected rejection for {:?}",
                stored
            );
        }
    }

    #[test]
    fn test_truncated_digest_is_rejected() {
        let good = fast_hasher().hash("pw");
        let truncated = &good[..good.len() - 2];

        assert!(!verify_password("pw", truncated));
    }

    #[test]
    fn test_with_iterations_clamps() {
        assert_eq!(PasswordHasher::with_iterations(0).iterations(), 1);
        assert_eq!(
            PasswordHasher::with_iterations(u32::MAX).iterations(),
            MAX_ITERATIONS
        );
    }
}
