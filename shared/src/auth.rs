use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fixit_atoms::users::{IdentityError, IdentityProvider, SessionUser};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use tokio::sync::watch;

type HmacSha256 = Hmac<Sha256>;

/// Tokens issued by Cognito for the signed-in user. Never leaves this module.
struct Tokens {
    access_token: String,
}

/// Identity provider backed by a Cognito user pool.
///
/// The pool is expected to verify email addresses by link, so the only
/// client-side verification step is asking Cognito to send the message.
pub struct CognitoIdentity {
    client: CognitoClient,
    client_id: String,
    client_secret: Option<String>,
    tokens: Mutex<Option<Tokens>>,
    session: watch::Sender<Option<SessionUser>>,
}

/// Cognito `SECRET_HASH`: base64(HMAC-SHA256(secret, username + client_id))
pub fn secret_hash(
    username: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, IdentityError> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| IdentityError::Service(format!("Invalid client secret: {}", e)))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Map an SDK failure to an identity error, keeping the service message.
fn to_identity_error<E>(operation: &str, err: E) -> IdentityError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.code() {
        Some(code) => IdentityError::Rejected {
            code: code.to_string(),
            message: err.message().unwrap_or(code).to_string(),
        },
        None => IdentityError::Service(format!(
            "Cognito {} error: {}",
            operation,
            DisplayErrorContext(&err)
        )),
    }
}

impl CognitoIdentity {
    pub fn new(client: CognitoClient, client_id: String, client_secret: Option<String>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            client,
            client_id,
            client_secret,
            tokens: Mutex::new(None),
            session,
        }
    }

    fn hash_for(&self, username: &str) -> Result<Option<String>, IdentityError> {
        self.client_secret
            .as_deref()
            .map(|secret| secret_hash(username, &self.client_id, secret))
            .transpose()
    }

    async fn load_user(&self, access_token: &str, email: &str) -> Result<SessionUser, IdentityError> {
        let output = self
            .client
            .get_user()
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| to_identity_error("get_user", e))?;

        let attrs = output.user_attributes();
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.value())
        };

        Ok(SessionUser {
            user_id: attr("sub").unwrap_or(output.username()).to_string(),
            email: attr("email").unwrap_or(email).to_string(),
            email_verified: attr("email_verified") == Some("true"),
        })
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        tracing::info!("🔐 Cognito sign-in requested for {}", email);

        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password);
        if let Some(hash) = self.hash_for(email)? {
            request = request.auth_parameters("SECRET_HASH", hash);
        }

        let output = request.send().await.map_err(|e| {
            let unconfirmed = e
                .as_service_error()
                .is_some_and(|se| se.is_user_not_confirmed_exception());
            if unconfirmed {
                IdentityError::EmailNotVerified
            } else {
                to_identity_error("initiate_auth", e)
            }
        })?;

        let Some(access_token) = output
            .authentication_result()
            .and_then(|r| r.access_token())
            .map(|t| t.to_string())
        else {
            let challenge = output
                .challenge_name()
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| "UnknownChallenge".to_string());
            tracing::warn!("⚠️ Cognito sign-in for {} stopped at challenge {}", email, challenge);
            return Err(IdentityError::rejected(
                challenge.clone(),
                format!("Sign-in requires an additional step ({}).", challenge),
            ));
        };

        let user = self.load_user(&access_token, email).await?;
        *self.tokens.lock() = Some(Tokens { access_token });
        self.session.send_replace(Some(user.clone()));

        tracing::info!(
            "✅ Cognito sign-in: user_id={}, verified={}",
            user.user_id,
            user.email_verified
        );
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        tracing::info!("📝 Cognito sign-up requested for {}", email);

        let email_attr = AttributeType::builder()
            .name("email")
            .value(email)
            .build()
            .map_err(|e| IdentityError::Service(format!("Failed to build email attribute: {}", e)))?;

        let mut request = self
            .client
            .sign_up()
            .client_id(&self.client_id)
            .username(email)
            .password(password)
            .user_attributes(email_attr);
        if let Some(hash) = self.hash_for(email)? {
            request = request.secret_hash(hash);
        }

        let output = request
            .send()
            .await
            .map_err(|e| to_identity_error("sign_up", e))?;

        let user = SessionUser {
            user_id: output.user_sub().to_string(),
            email: email.to_string(),
            email_verified: false,
        };
        // A fresh account counts as signed in but unverified until the link is followed.
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn send_verification_email(&self, user: &SessionUser) -> Result<(), IdentityError> {
        let mut request = self
            .client
            .resend_confirmation_code()
            .client_id(&self.client_id)
            .username(&user.email);
        if let Some(hash) = self.hash_for(&user.email)? {
            request = request.secret_hash(hash);
        }

        request
            .send()
            .await
            .map_err(|e| to_identity_error("resend_confirmation_code", e))?;
        tracing::info!("📧 Verification email sent to {}", user.email);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let tokens = self.tokens.lock().take();
        if let Some(tokens) = tokens {
            if let Err(e) = self
                .client
                .global_sign_out()
                .access_token(tokens.access_token)
                .send()
                .await
            {
                tracing::warn!("⚠️ Cognito global_sign_out failed: {}", DisplayErrorContext(&e));
            }
        }
        self.session.send_replace(None);
        Ok(())
    }

    fn session(&self) -> watch::Receiver<Option<SessionUser>> {
        self.session.subscribe()
    }
}
