//! Screen-level actions: login, signup and sign-out.
//!
//! Each handler validates its form locally, delegates the network call to the
//! identity provider and reports the result through an [`AlertPresenter`].
//! Successful sign-in/sign-up does not navigate; the auth gate reacts to the
//! resulting state change instead.

mod alerts;
mod forms;
mod login;
mod sign_out;
mod signup;
mod submit;

pub use alerts::{Alert, AlertPresenter, ERROR_TITLE, UNEXPECTED_ERROR};
pub use forms::{LoginForm, SignupForm, ValidationError, MIN_PASSWORD_CHARS};
pub use login::{LoginHandler, LoginOutcome, LOGIN_FAILED_TITLE};
pub use sign_out::{SignOutHandler, SignOutOutcome, SIGN_OUT_FAILED_TITLE};
pub use signup::{
    SignupHandler, SignupOutcome, ACCOUNT_CREATED_MESSAGE, SIGNUP_FAILED_TITLE, SUCCESS_TITLE,
    VERIFY_EMAIL_MESSAGE,
};
pub use submit::{SubmitControl, SubmitGuard};
