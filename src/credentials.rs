use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static USER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)user\s*:\s*(.+)").expect("pattern is valid"));
static PASS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)pass\s*:\s*(.+)").expect("pattern is valid"));
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("pattern is valid"));

/// Expected login pair, parsed from the showcase's plain-text credential
/// file. Each line is captured independently, so a file can carry a user
/// without a password; the flow then degrades at the password step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    user: Option<String>,
    pass: Option<String>,
}

impl CredentialStore {
    /// Captures `user: <value>` and `pass: <value>` lines. Labels are
    /// case-insensitive and values are trimmed.
    pub fn parse(text: &str) -> Self {
        Self {
            user: capture(&USER_PATTERN, text),
            pass: capture(&PASS_PATTERN, text),
        }
    }

    /// Store for a showcase without a readable credential file. Every
    /// submission fails with [`LoginError::StoreUnavailable`].
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn pass(&self) -> Option<&str> {
        self.pass.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.user.is_some() && self.pass.is_some()
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|groups| groups[1].trim().to_string())
}

/// Loose shape check used before comparing email-style usernames.
pub fn is_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value)
}

/// Validation outcomes surfaced to the login form, worded for the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("No se pudieron cargar las credenciales.")]
    StoreUnavailable,
    #[error("Introduce un email válido.")]
    MalformedEmail,
    #[error("Email incorrecto.")]
    WrongUser,
    #[error("Usuario o contraseña incorrectos.")]
    BadCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Username,
    Password,
    Authenticated,
}

/// Two-step login gate: confirm the username, then the password.
///
/// The username comparison trims the input; the password must match
/// byte-for-byte. When the expected user looks like an email address the
/// first step also rejects inputs that are not shaped like one, before
/// revealing whether the address itself is right.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    store: CredentialStore,
    step: LoginStep,
    confirmed_user: Option<String>,
}

impl LoginFlow {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            step: LoginStep::Username,
            confirmed_user: None,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn is_authenticated(&self) -> bool {
        self.step == LoginStep::Authenticated
    }

    pub fn is_available(&self) -> bool {
        self.store.is_available()
    }

    /// First step. On success the flow moves to the password step and
    /// remembers the confirmed username. Resubmitting re-validates.
    pub fn submit_username(&mut self, input: &str) -> Result<(), LoginError> {
        if self.step == LoginStep::Authenticated {
            return Ok(());
        }
        let Some(expected) = self.store.user() else {
            return Err(LoginError::StoreUnavailable);
        };
        if expected.contains('@') && !is_email(input) {
            return Err(LoginError::MalformedEmail);
        }
        if input.trim() != expected {
            return Err(LoginError::WrongUser);
        }
        self.confirmed_user = Some(input.trim().to_string());
        self.step = LoginStep::Password;
        Ok(())
    }

    /// Second step. Verifies the pair as a whole, so a username that was
    /// never confirmed fails here rather than slipping through.
    pub fn submit_password(&mut self, password: &str) -> Result<(), LoginError> {
        if self.step == LoginStep::Authenticated {
            return Ok(());
        }
        let (Some(user), Some(pass)) = (self.store.user(), self.store.pass()) else {
            return Err(LoginError::StoreUnavailable);
        };
        let confirmed = self.confirmed_user.as_deref().unwrap_or("");
        if confirmed != user || password != pass {
            return Err(LoginError::BadCredentials);
        }
        self.step = LoginStep::Authenticated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_captures_both_lines() {
        let store = CredentialStore::parse("user: admin\npass: s3cret\n");
        assert_eq!(store.user(), Some("admin"));
        assert_eq!(store.pass(), Some("s3cret"));
        assert!(store.is_available());
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        let store = CredentialStore::parse("USER :  Admin  \r\nPass:\thunter2\t\n");
        assert_eq!(store.user(), Some("Admin"));
        assert_eq!(store.pass(), Some("hunter2"));
    }

    #[test]
    fn lines_are_captured_independently() {
        let store = CredentialStore::parse("user: solo\n");
        assert_eq!(store.user(), Some("solo"));
        assert_eq!(store.pass(), None);
        assert!(!store.is_available());
    }

    #[test]
    fn email_shape_check() {
        assert!(is_email("aeon@studio.dev"));
        assert!(is_email("a@b.co"));
        assert!(!is_email("plain"));
        assert!(!is_email("missing@dot"));
        assert!(!is_email("two words@site.com"));
        assert!(!is_email(" leading@space.com"));
    }

    #[test]
    fn full_flow_succeeds_with_matching_pair() {
        let mut flow = LoginFlow::new(CredentialStore::parse("user: admin\npass: 1234\n"));
        assert_eq!(flow.step(), LoginStep::Username);
        flow.submit_username("admin").unwrap();
        assert_eq!(flow.step(), LoginStep::Password);
        flow.submit_password("1234").unwrap();
        assert!(flow.is_authenticated());
    }

    #[test]
    fn username_comparison_trims_input() {
        let mut flow = LoginFlow::new(CredentialStore::parse("user: admin\npass: 1234\n"));
        flow.submit_username("  admin  ").unwrap();
        assert_eq!(flow.step(), LoginStep::Password);
    }

    #[test]
    fn password_comparison_does_not_trim() {
        let mut flow = LoginFlow::new(CredentialStore::parse("user: admin\npass: 1234\n"));
        flow.submit_username("admin").unwrap();
        assert_eq!(
            flow.submit_password(" 1234"),
            Err(LoginError::BadCredentials)
        );
        assert_eq!(flow.step(), LoginStep::Password);
    }

    #[test]
    fn wrong_username_stays_on_first_step() {
        let mut flow = LoginFlow::new(CredentialStore::parse("user: admin\npass: 1234\n"));
        assert_eq!(flow.submit_username("root"), Err(LoginError::WrongUser));
        assert_eq!(flow.step(), LoginStep::Username);
    }

    #[test]
    fn email_users_require_email_shaped_input() {
        let mut flow =
            LoginFlow::new(CredentialStore::parse("user: aeon@studio.dev\npass: orbit\n"));
        assert_eq!(
            flow.submit_username("not-an-email"),
            Err(LoginError::MalformedEmail)
        );
        // well-shaped but wrong address gets the specific message
        assert_eq!(
            flow.submit_username("other@studio.dev"),
            Err(LoginError::WrongUser)
        );
        flow.submit_username("aeon@studio.dev").unwrap();
        flow.submit_password("orbit").unwrap();
        assert!(flow.is_authenticated());
    }

    #[test]
    fn plain_usernames_skip_the_email_check() {
        let mut flow = LoginFlow::new(CredentialStore::parse("user: admin\npass: 1234\n"));
        // "admin" has no @, so any shape is allowed through to comparison
        assert_eq!(flow.submit_username("nope"), Err(LoginError::WrongUser));
    }

    #[test]
    fn unavailable_store_blocks_both_steps() {
        let mut flow = LoginFlow::new(CredentialStore::unavailable());
        assert_eq!(
            flow.submit_username("anyone"),
            Err(LoginError::StoreUnavailable)
        );
        assert_eq!(
            flow.submit_password("anything"),
            Err(LoginError::StoreUnavailable)
        );
    }

    #[test]
    fn user_without_password_fails_at_password_step() {
        let mut flow = LoginFlow::new(CredentialStore::parse("user: admin\n"));
        flow.submit_username("admin").unwrap();
        assert_eq!(
            flow.submit_password("1234"),
            Err(LoginError::StoreUnavailable)
        );
    }

    #[test]
    fn messages_match_the_form_wording() {
        assert_eq!(
            LoginError::StoreUnavailable.to_string(),
            "No se pudieron cargar las credenciales."
        );
        assert_eq!(
            LoginError::MalformedEmail.to_string(),
            "Introduce un email válido."
        );
        assert_eq!(LoginError::WrongUser.to_string(), "Email incorrecto.");
        assert_eq!(
            LoginError::BadCredentials.to_string(),
            "Usuario o contraseña incorrectos."
        );
    }
}
