//! `login`, `logout` and `whoami`.

use secrecy::SecretString;

use vivahart_storefront::Storefront;

use super::{CommandError, out, prompt_line};

/// Log in. Without `--password` the password is read from stdin.
///
/// # Errors
///
/// Returns an error if the password cannot be read or login fails.
pub async fn login(
    storefront: &mut Storefront,
    email: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let password = match password {
        Some(password) => password,
        None => prompt_line("Password: ")?,
    };
    let password = SecretString::from(password);

    let user = storefront.login(email, &password).await?;
    out(format_args!("Logged in as {} <{}>", user.full_name(), user.email));
    out(format_args!("{} item(s) in your account cart", storefront.cart().item_count()));
    Ok(())
}

pub fn logout(storefront: &mut Storefront) {
    storefront.logout();
    out("Local session and cart cleared");
}

pub fn whoami(storefront: &Storefront) {
    let session = storefront.session();
    match (session.is_authenticated(), session.user()) {
        (true, Some(user)) => out(format_args!("{} <{}>", user.full_name(), user.email)),
        (true, None) => out("Logged in (user record unavailable)"),
        (false, _) => out("Not logged in"),
    }
}
