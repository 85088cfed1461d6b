//! Defines functions for handling user authentication with cookies.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{Error, user::UserId};

pub(crate) const COOKIE_USER_ID: &str = "user_id";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";

/// The default duration for which auth cookies are valid.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(12);

const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Add an auth cookie to the cookie jar, indicating that a user is logged in
/// and authenticated.
///
/// Sets the expiry of the cookie to `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns a [time::error::Format] if the expiry time cannot be formatted.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserId,
    duration: Duration,
) -> Result<PrivateCookieJar, time::error::Format> {
    let expiry = OffsetDateTime::now_utc() + duration;
    // Use format instead of to_string to avoid errors at midnight when the
    // hour is printed as a single digit when DATE_TIME_FORMAT expects two
    // digits.
    let expiry_string = expiry.format(DATE_TIME_FORMAT)?;

    Ok(jar
        .add(
            Cookie::build((COOKIE_USER_ID, user_id.as_i64().to_string()))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        )
        .add(
            Cookie::build((COOKIE_EXPIRY, expiry_string))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which
/// should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Extract the logged-in user's ID from the auth cookies in `jar`.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if either auth cookie is not in the jar.
/// - [Error::InvalidDateFormat] if the expiry cookie cannot be parsed.
/// - [Error::InvalidCredentials] if the cookie has expired or the user ID is
///   not a valid integer.
pub(crate) fn get_user_id_from_cookies(jar: &PrivateCookieJar) -> Result<UserId, Error> {
    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::CookieMissing)?;
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;

    let expiry = PrimitiveDateTime::parse(expiry_cookie.value(), DATE_TIME_FORMAT)
        .map_err(|error| {
            Error::InvalidDateFormat(error.to_string(), expiry_cookie.value().to_owned())
        })?
        .assume_utc();

    if expiry < OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    user_id_cookie
        .value()
        .parse()
        .map(UserId::new)
        .map_err(|_| Error::InvalidCredentials)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use time::Duration;

    use crate::{Error, user::UserId};

    use super::{get_user_id_from_cookies, invalidate_auth_cookie, set_auth_cookie};

    fn get_test_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::generate())
    }

    #[test]
    fn set_then_get_round_trips() {
        let jar = get_test_jar();
        let user_id = UserId::new(7);

        let jar = set_auth_cookie(jar, user_id, Duration::minutes(5)).unwrap();

        assert_eq!(get_user_id_from_cookies(&jar), Ok(user_id));
    }

    #[test]
    fn get_fails_on_empty_jar() {
        let jar = get_test_jar();

        assert_eq!(get_user_id_from_cookies(&jar), Err(Error::CookieMissing));
    }

    #[test]
    fn get_fails_on_expired_cookie() {
        let jar = get_test_jar();
        let user_id = UserId::new(7);

        let jar = set_auth_cookie(jar, user_id, Duration::minutes(-5)).unwrap();

        assert_eq!(
            get_user_id_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn invalidate_removes_valid_cookie() {
        let jar = get_test_jar();
        let user_id = UserId::new(7);

        let jar = set_auth_cookie(jar, user_id, Duration::minutes(5)).unwrap();
        let jar = invalidate_auth_cookie(jar);

        assert!(get_user_id_from_cookies(&jar).is_err());
    }
}
