use validator::validate_email;

/// An email address submitted through the web form, checked for syntax with `validator`.
///
/// The registry only needs the address to be present; this type is the stricter gate the HTTP
/// surface puts in front of it. No case folding or trimming is applied: two addresses differing
/// only in case are distinct subscriptions.
#[derive(Debug, Clone)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<SubscriberEmail, String> {
        if s.trim().is_empty() {
            return Err("A subscriber email is required.".to_string());
        }
        if validate_email(s.as_str()) {
            Ok(Self(s))
        } else {
            Err(format!("{s:?} is not a valid subscriber email."))
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SubscriberEmail> for String {
    fn from(email: SubscriberEmail) -> Self {
        email.0
    }
}
