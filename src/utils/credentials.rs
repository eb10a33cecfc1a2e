use subtle::ConstantTimeEq;

/// Credential check behind a trait so the state machine never sees how the
/// comparison is performed. The current deployment compares fixed plaintext
/// values (the behavioral contract inherited from the storefront); swapping
/// in a hashed, server-side verifier only means providing another impl here.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

#[derive(Clone)]
pub struct PlaintextVerifier {
    username: String,
    password: String,
}

impl PlaintextVerifier {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        // Exact equality, but constant-time so length/prefix timing leaks
        // nothing. Always compare both fields.
        let user_ok = ct_eq(username, &self.username);
        let pass_ok = ct_eq(password, &self.password);
        user_ok & pass_ok
    }
}

fn ct_eq(given: &str, expected: &str) -> bool {
    if given.len() != expected.len() {
        // ct_eq requires equal-length slices; a length mismatch is already
        // observable, so shortcutting here leaks nothing new.
        return false;
    }
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}
