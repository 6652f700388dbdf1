//! Identity provider implementations.

mod apple;
mod google;
mod guest;

pub use apple::{AppleConfig, AppleProvider};
pub use google::{GoogleConfig, GoogleProvider};
pub use guest::GuestProvider;

use crate::{AuthData, AuthError};

/// Returns the non-empty value of `field`.
pub(crate) fn required_field<'a>(
    data: &'a AuthData,
    field: &'static str,
) -> Result<&'a str, AuthError> {
    data.get(field)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingRequiredField(field))
}

/// Returns the value of `field`, or `None` if absent or empty.
pub(crate) fn optional_field<'a>(data: &'a AuthData, field: &str) -> Option<&'a str> {
    data.get(field)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
