/// A subscription request with both required fields present.
///
/// Presence is the only thing checked here. Whether an email is well formed, or a name is
/// acceptable for display, is decided by whoever collects the input before it reaches the
/// registry (the web form does it with `SubscriberEmail` and `SubscriberName`).
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: String,
    pub name: String,
}

impl NewSubscriber {
    pub fn parse(email: String, name: String) -> Result<NewSubscriber, String> {
        if email.trim().is_empty() {
            return Err("A subscriber email is required.".to_string());
        }
        if name.trim().is_empty() {
            return Err("A subscriber name is required.".to_string());
        }
        Ok(Self { email, name })
    }
}
