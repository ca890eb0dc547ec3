//! Shipping contact update command.

use std::sync::{Arc, Mutex};

use reflow_sdk::reflow_core::{
    ApplicationError, Command, ErrorAggregator, FragmentSpec, RequestContext,
};

/// Maximum length of a first or last name.
pub const NAME_LIMIT: usize = 25;

/// Maximum length of an email address.
pub const EMAIL_LIMIT: usize = 100;

/// The shipping contact of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Persistence collaborator for the shipping contact.
pub trait ContactStore: Send + Sync {
    fn save_contact(&self, contact: &ShippingContact) -> anyhow::Result<()>;
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryContactStore {
    saved: Mutex<Vec<ShippingContact>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contacts saved so far, in save order.
    pub fn saved(&self) -> Vec<ShippingContact> {
        self.saved.lock().expect("store lock").clone()
    }
}

impl ContactStore for InMemoryContactStore {
    fn save_contact(&self, contact: &ShippingContact) -> anyhow::Result<()> {
        self.saved.lock().expect("store lock").push(contact.clone());
        Ok(())
    }
}

/// Updates the order's shipping contact and re-renders the widgets that
/// show it.
pub struct ShippingContactCommand {
    store: Arc<dyn ContactStore>,
    saved: Option<ShippingContact>,
}

impl ShippingContactCommand {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store, saved: None }
    }
}

impl Command for ShippingContactCommand {
    fn name(&self) -> &str {
        "shippingContactUpdate"
    }

    fn validate(
        &mut self,
        ctx: &RequestContext,
        errors: &mut ErrorAggregator,
    ) -> anyhow::Result<()> {
        // Every field is checked; reporting one failure never stops the rest.
        validate_name(ctx, errors, "firstName", "first name");
        validate_name(ctx, errors, "lastName", "last name");
        validate_email(ctx, errors);
        Ok(())
    }

    fn execute(&mut self, ctx: &RequestContext) -> anyhow::Result<()> {
        let contact = ShippingContact {
            first_name: ctx.param("firstName").unwrap_or_default().to_string(),
            last_name: ctx.param("lastName").unwrap_or_default().to_string(),
            email: ctx.param("email").unwrap_or_default().to_string(),
        };
        self.store.save_contact(&contact)?;
        self.saved = Some(contact);
        Ok(())
    }

    fn fragments(&self, _ctx: &RequestContext) -> Vec<FragmentSpec> {
        vec![
            FragmentSpec::new("shippingContact", "checkout/shipping_contact"),
            FragmentSpec::new("orderSummary", "checkout/order_summary"),
        ]
    }

    fn payload_data(&self, _ctx: &RequestContext) -> serde_json::Value {
        match &self.saved {
            Some(contact) => serde_json::json!({
                "contact": {
                    "firstName": contact.first_name,
                    "lastName": contact.last_name,
                    "email": contact.email,
                }
            }),
            None => serde_json::Value::Null,
        }
    }
}

fn validate_name(
    ctx: &RequestContext,
    errors: &mut ErrorAggregator,
    param: &str,
    label: &str,
) {
    match ctx.param(param) {
        None | Some("") => errors.add_application_error(ApplicationError::new(
            format!("checkout.contact.{param}.missing"),
            format!("A {label} is required."),
        )),
        Some(value) if value.chars().count() > NAME_LIMIT => {
            errors.add_application_error(
                ApplicationError::new(
                    format!("checkout.contact.{param}.tooLong"),
                    format!("The {label} may not exceed {NAME_LIMIT} characters."),
                )
                .with_param(NAME_LIMIT.to_string()),
            )
        }
        Some(_) => {}
    }
}

fn validate_email(ctx: &RequestContext, errors: &mut ErrorAggregator) {
    match ctx.param("email") {
        None | Some("") => errors.add_application_error(ApplicationError::new(
            "checkout.contact.email.missing",
            "An email address is required.",
        )),
        Some(value) if value.chars().count() > EMAIL_LIMIT => {
            errors.add_application_error(
                ApplicationError::new(
                    "checkout.contact.email.tooLong",
                    format!("The email address may not exceed {EMAIL_LIMIT} characters."),
                )
                .with_param(EMAIL_LIMIT.to_string()),
            )
        }
        Some(value) if !looks_like_email(value) => {
            errors.add_application_error(ApplicationError::new(
                "checkout.contact.email.invalid",
                "The email address does not look valid.",
            ))
        }
        Some(_) => {}
    }
}

/// Shape check only; deliverability is not a validation concern.
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(first: &str, last: &str, email: &str) -> RequestContext {
        RequestContext::builder(http::Method::POST, "/checkout/shipping-contact")
            .param("firstName", first)
            .param("lastName", last)
            .param("email", email)
            .build()
    }

    fn validated(ctx: &RequestContext) -> ErrorAggregator {
        let mut errors = ErrorAggregator::new();
        let mut command = ShippingContactCommand::new(Arc::new(InMemoryContactStore::new()));
        command.validate(ctx, &mut errors).unwrap();
        errors
    }

    #[test]
    fn test_valid_contact_passes() {
        let errors = validated(&ctx("Ada", "Lovelace", "ada@example.com"));
        assert!(!errors.has_errors());
    }

    #[test]
    fn test_long_first_name_rejected() {
        let long = "A".repeat(NAME_LIMIT + 1);
        let errors = validated(&ctx(&long, "Lovelace", "ada@example.com"));
        let messages: Vec<&str> = errors.application_errors().iter().map(|e| e.message()).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("first name"));
    }

    #[test]
    fn test_all_fields_validated_before_reporting() {
        let errors = validated(&ctx("", "", "not-an-email"));
        let codes: Vec<&str> = errors.application_errors().iter().map(|e| e.code()).collect();
        assert_eq!(
            codes,
            vec![
                "checkout.contact.firstName.missing",
                "checkout.contact.lastName.missing",
                "checkout.contact.email.invalid",
            ]
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada.example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@nodot"));
    }

    #[test]
    fn test_execute_saves_contact() {
        let store = Arc::new(InMemoryContactStore::new());
        let mut command = ShippingContactCommand::new(store.clone());
        let ctx = ctx("Ada", "Lovelace", "ada@example.com");

        command.execute(&ctx).unwrap();

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].first_name, "Ada");
        assert_eq!(command.payload_data(&ctx)["contact"]["email"], "ada@example.com");
    }
}
