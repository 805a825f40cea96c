use axum::response::Redirect;
use serde::Deserialize;

/// Body of `POST /signup` (urlencoded form). Every field is optional so that
/// absence can be reported as `missing` instead of a parse rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

/// Signup fields once every one is known to be present and non-empty.
#[derive(Debug)]
pub struct ValidSignup {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(self) -> Result<ValidSignup, AuthRedirect> {
        fn present(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }

        let (Some(name), Some(surname), Some(email), Some(password), Some(confirm)) = (
            present(self.name),
            present(self.surname),
            present(self.email),
            present(self.password),
            present(self.confirm_password),
        ) else {
            return Err(AuthRedirect::Missing);
        };

        if password != confirm {
            return Err(AuthRedirect::Mismatch);
        }

        Ok(ValidSignup {
            name,
            surname,
            email,
            password,
        })
    }
}

/// Body of `POST /login` (urlencoded form).
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Browser-facing failure outcomes of the two form endpoints, carried back
/// as `?error=<classifier>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRedirect {
    Missing,
    Mismatch,
    Exists,
    Failed,
    Invalid,
}

impl AuthRedirect {
    pub fn classifier(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Mismatch => "mismatch",
            Self::Exists => "exists",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
        }
    }

    fn page(self) -> &'static str {
        match self {
            Self::Invalid => "/login",
            _ => "/signup",
        }
    }

    pub fn location(self) -> String {
        format!("{}?error={}", self.page(), self.classifier())
    }

    pub fn redirect(self) -> Redirect {
        Redirect::to(&self.location())
    }
}
