use anyhow::Result;
use postsphere_types::{LoginRequest, ResetPasswordRequest, SignupRequest, User};

use crate::api::{ApiClient, ApiError};
use crate::error::{ClientError, ClientResult};
use crate::session::{Session, SessionHandle};
use crate::storage::StorageAdapter;
use crate::validation::{passwords_match, require, validate_password, SignupForm};

/// Login, logout and signup against the remote API.
///
/// The service is the only writer of the shared [`SessionHandle`]; every
/// other component reads it through the [`ApiClient`].
pub struct AuthService {
    api_client: ApiClient,
    storage: Box<dyn StorageAdapter>,
}

impl AuthService {
    pub fn new(api_client: ApiClient, storage: Box<dyn StorageAdapter>) -> Self {
        Self { api_client, storage }
    }

    pub fn session(&self) -> &SessionHandle {
        self.api_client.session()
    }

    pub fn current(&self) -> Option<Session> {
        self.session().current()
    }

    /// Publishes the persisted session, if any, to the handle.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user))` if a stored session was restored
    /// - `Ok(None)` if nothing usable was stored
    /// - `Err(_)` if the storage could not be read
    pub fn restore_session(&self) -> Result<Option<User>> {
        match self.storage.load_session()? {
            Some(session) => {
                crate::log_session!("Restored session for {}", session.username());
                let user = session.user.clone();
                self.session().set(session);
                Ok(Some(user))
            }
            None => {
                log::debug!("No stored session found");
                Ok(None)
            }
        }
    }

    /// Validates the form locally, then registers the account.
    /// Returns the server's confirmation text.
    pub async fn signup(&self, form: &SignupForm) -> ClientResult<String> {
        form.validate()?;

        let request = SignupRequest {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            bio: form.bio.clone(),
            password: form.password.clone(),
        };

        match self.api_client.signup(&request).await {
            Ok(message) => {
                crate::log_session!("Signed up {}", request.username);
                Ok(message)
            }
            Err(e) => Err(server_text_or(e)),
        }
    }

    /// Exchanges credentials for a session, persists it and publishes it.
    ///
    /// Any answer from the server other than success is reported as
    /// "Invalid credentials"; the server's own error text is not shown.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<User> {
        require(username, "Username")?;
        if password.is_empty() {
            return Err(ClientError::Validation("Password is required".to_string()));
        }

        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };

        let response = match self.api_client.login(&request).await {
            Ok(response) => response,
            Err(e) if e.status().is_some() => {
                log::warn!("Login rejected for {}: status {:?}", request.username, e.status());
                return Err(ClientError::AuthRequired("Invalid credentials".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let (user, token) = response.into_parts();
        let session = Session::new(user.clone(), token);

        // The in-memory session is still valid if persisting fails
        if let Err(e) = self.storage.store_session(&session) {
            log::warn!("Failed to persist session: {}", e);
        }
        self.session().set(session);
        crate::log_session!("Logged in as {} (id {})", user.username, user.id);

        Ok(user)
    }

    /// Forgets the session locally and in storage
    pub fn logout(&self) -> Result<()> {
        if let Some(username) = self.session().username() {
            crate::log_session!("Logging out {}", username);
        }
        self.session().clear();
        self.storage.clear_session()
    }
}

/// Where a password reset stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetStep {
    RequestCode,
    /// A code was emailed to `email`; the client does not know it
    AwaitingCode { email: String },
    Completed,
}

/// Two-step password reset.
///
/// The verification code only ever comes from the user in
/// [`complete`](PasswordReset::complete). Whatever the server returns from
/// the first step is discarded unread.
pub struct PasswordReset {
    api_client: ApiClient,
    step: ResetStep,
}

impl PasswordReset {
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            api_client,
            step: ResetStep::RequestCode,
        }
    }

    /// Resumes at the code-entry step for `email`, e.g. in a later process
    pub fn awaiting(api_client: ApiClient, email: impl Into<String>) -> Self {
        Self {
            api_client,
            step: ResetStep::AwaitingCode { email: email.into() },
        }
    }

    pub fn step(&self) -> &ResetStep {
        &self.step
    }

    /// Asks the server to email a verification code to `email`
    pub async fn request_code(&mut self, email: &str) -> ClientResult<String> {
        require(email, "Email")?;
        let email = email.trim().to_string();

        // The response body may echo the code; drop it without looking
        self.api_client
            .forgot_password(&email)
            .await
            .map_err(server_text_or)?;

        crate::log_session!("Password reset code requested");
        let message = format!("A verification code has been sent to {}", email);
        self.step = ResetStep::AwaitingCode { email };
        Ok(message)
    }

    /// Sets the new password using the code the user typed in
    pub async fn complete(&mut self, code: &str, new_password: &str, confirm: &str) -> ClientResult<String> {
        let email = match &self.step {
            ResetStep::AwaitingCode { email } => email.clone(),
            ResetStep::RequestCode => {
                return Err(ClientError::Validation(
                    "Request a verification code first".to_string(),
                ))
            }
            ResetStep::Completed => {
                return Err(ClientError::Validation(
                    "Password has already been reset".to_string(),
                ))
            }
        };

        require(code, "Verification code")?;
        passwords_match(new_password, confirm)?;
        validate_password(new_password)?;

        let request = ResetPasswordRequest {
            email,
            verification_code: code.trim().to_string(),
            new_password: new_password.to_string(),
        };
        let message = self
            .api_client
            .reset_password(&request)
            .await
            .map_err(server_text_or)?;
        drop(request);

        crate::log_session!("Password reset completed");
        self.step = ResetStep::Completed;
        if message.trim().is_empty() {
            Ok("Password reset successful".to_string())
        } else {
            Ok(message)
        }
    }
}

/// Shows the server's error text when it answered, the categorized transport
/// message otherwise
fn server_text_or(error: ApiError) -> ClientError {
    match error.server_message() {
        Some(text) if !text.trim().is_empty() && error.status() != Some(403) => {
            ClientError::ActionFailed(text.trim().to_string())
        }
        _ => error.into(),
    }
}
