//! Lock, send, apply, unlock.

use reflow_envelope::ResponseEnvelope;

use crate::dom::{DocumentView, MessageSeverity};
use crate::request::UpdateRequest;
use crate::transport::{Transport, TransportError};

/// Generic message rendered when no response arrives at all.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "We could not reach the server. Please check your connection and try again.";

/// Callback replacing the default envelope application.
pub type ApplyCallback<D> = Box<dyn FnMut(&ResponseEnvelope, &mut D) + Send>;

/// Callback replacing the default transport-failure handling.
pub type FailureCallback<D> = Box<dyn FnMut(&TransportError, &mut D) + Send>;

/// Optional per-invocation behavior overrides.
pub struct UpdateOptions<D: DocumentView> {
    on_success: Option<ApplyCallback<D>>,
    on_error: Option<FailureCallback<D>>,
}

impl<D: DocumentView> Default for UpdateOptions<D> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<D: DocumentView> UpdateOptions<D> {
    /// Defaults for both outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default envelope application.
    pub fn on_success(mut self, callback: ApplyCallback<D>) -> Self {
        self.on_success = Some(callback);
        self
    }

    /// Replace the default transport-failure handling.
    pub fn on_error(mut self, callback: FailureCallback<D>) -> Self {
        self.on_error = Some(callback);
        self
    }
}

/// What one invocation did to the page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Fragment keys whose elements were patched.
    pub patched: Vec<String>,
    /// Number of error messages rendered.
    pub rendered_errors: usize,
    /// Whether the transport delivered no envelope.
    pub transport_failed: bool,
}

/// Drives one asynchronous update against the page.
///
/// Each invocation issues exactly one network call and delivers exactly one
/// outcome; callers are responsible for not re-entering an already locked
/// region. Locking and unlocking are synchronous and run on every path.
pub struct UpdateController<T: Transport> {
    transport: T,
}

impl<T: Transport> UpdateController<T> {
    /// Create a controller over a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Issue the request and apply its outcome to the page.
    ///
    /// The elements disabled at the start are re-enabled on every exit
    /// path; this is the one guaranteed cleanup action of the operation.
    pub async fn submit<D: DocumentView>(
        &self,
        dom: &mut D,
        request: &UpdateRequest,
        mut options: UpdateOptions<D>,
    ) -> UpdateOutcome {
        let locked = dom.disable_ajax_regions();
        tracing::debug!(url = request.url(), locked = locked.len(), "update issued");

        let outcome = match self.transport.send(request).await {
            Ok(envelope) => match options.on_success.as_mut() {
                Some(callback) => {
                    callback(&envelope, dom);
                    UpdateOutcome::default()
                }
                None => apply_envelope(dom, request, &envelope),
            },
            Err(error) => {
                tracing::warn!(url = request.url(), error = %error, "transport failure");
                match options.on_error.as_mut() {
                    Some(callback) => {
                        callback(&error, dom);
                        UpdateOutcome {
                            transport_failed: true,
                            ..UpdateOutcome::default()
                        }
                    }
                    None => render_transport_failure(dom, request),
                }
            }
        };

        dom.enable_elements(&locked);
        outcome
    }
}

/// Default application of a received envelope.
///
/// Patches every fragment whose key names an existing element, then clears
/// the error container unconditionally and renders the envelope's messages,
/// so a previous run's errors never persist alongside new ones.
fn apply_envelope<D: DocumentView>(
    dom: &mut D,
    request: &UpdateRequest,
    envelope: &ResponseEnvelope,
) -> UpdateOutcome {
    let mut patched = Vec::new();
    for (key, html) in envelope.html() {
        if dom.replace_subtree(key, html) {
            patched.push(key.clone());
        } else {
            tracing::debug!(key = key.as_str(), "no element for fragment key");
        }
    }

    dom.clear_children(request.error_container());
    let mut rendered_errors = 0;
    for message in envelope.application_errors() {
        dom.append_message(request.error_container(), MessageSeverity::Application, message);
        rendered_errors += 1;
    }
    for message in envelope.system_errors() {
        dom.append_message(request.error_container(), MessageSeverity::System, message);
        rendered_errors += 1;
    }

    UpdateOutcome {
        patched,
        rendered_errors,
        transport_failed: false,
    }
}

/// Default handling when no envelope arrives: same rendering path, no patch.
fn render_transport_failure<D: DocumentView>(dom: &mut D, request: &UpdateRequest) -> UpdateOutcome {
    dom.clear_children(request.error_container());
    dom.append_message(
        request.error_container(),
        MessageSeverity::System,
        TRANSPORT_FAILURE_MESSAGE,
    );
    UpdateOutcome {
        patched: Vec::new(),
        rendered_errors: 1,
        transport_failed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::transport::StaticTransport;
    use reflow_core::{ApplicationError, ErrorAggregator};
    use reflow_envelope::EnvelopeBuilder;

    fn page() -> MemoryDocument {
        MemoryDocument::new()
            .with_container("orderSummary", "<div>stale</div>")
            .with_container("errorMessages", "")
            .with_interactive("submitButton", "checkoutForm")
            .with_interactive("quantityField", "checkoutForm")
    }

    fn request() -> UpdateRequest {
        UpdateRequest::builder(http::Method::POST, "/checkout/contact").build()
    }

    fn clean_envelope() -> reflow_envelope::ResponseEnvelope {
        EnvelopeBuilder::new()
            .fragment("orderSummary", "<div>fresh</div>")
            .fragment("unknownKey", "<div>orphan</div>")
            .build(&ErrorAggregator::new())
    }

    fn error_envelope(message: &str) -> reflow_envelope::ResponseEnvelope {
        let mut errors = ErrorAggregator::new();
        errors.add_application_error(ApplicationError::new("code", message));
        EnvelopeBuilder::new().build(&errors)
    }

    #[tokio::test]
    async fn test_success_patches_and_unlocks() {
        let transport = StaticTransport::new();
        transport.push_envelope(clean_envelope());
        let controller = UpdateController::new(transport);
        let mut dom = page();

        let outcome = controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        assert_eq!(outcome.patched, vec!["orderSummary".to_string()]);
        assert_eq!(outcome.rendered_errors, 0);
        assert_eq!(dom.html_of("orderSummary"), Some("<div>fresh</div>"));
        assert_eq!(dom.is_disabled("submitButton"), Some(false));
        assert_eq!(dom.is_disabled("quantityField"), Some(false));
    }

    #[tokio::test]
    async fn test_unknown_fragment_key_is_noop() {
        let transport = StaticTransport::new();
        transport.push_envelope(clean_envelope());
        let controller = UpdateController::new(transport);
        let mut dom = page();

        let outcome = controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        assert!(!outcome.patched.contains(&"unknownKey".to_string()));
        assert!(!dom.contains("unknownKey"));
    }

    #[tokio::test]
    async fn test_error_envelope_renders_and_unlocks() {
        let transport = StaticTransport::new();
        transport.push_envelope(error_envelope("The first name is too long."));
        let controller = UpdateController::new(transport);
        let mut dom = page();

        let outcome = controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        assert_eq!(outcome.rendered_errors, 1);
        let messages = dom.messages_of("errorMessages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1, "The first name is too long.");
        assert_eq!(dom.is_disabled("submitButton"), Some(false));
    }

    #[tokio::test]
    async fn test_second_invocation_replaces_stale_errors() {
        let transport = StaticTransport::new();
        transport.push_envelope(error_envelope("old message"));
        transport.push_envelope(error_envelope("new message"));
        let controller = UpdateController::new(transport);
        let mut dom = page();

        controller.submit(&mut dom, &request(), UpdateOptions::new()).await;
        controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        let messages = dom.messages_of("errorMessages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1, "new message");
    }

    #[tokio::test]
    async fn test_clean_envelope_clears_previous_errors() {
        let transport = StaticTransport::new();
        transport.push_envelope(error_envelope("bad input"));
        transport.push_envelope(clean_envelope());
        let controller = UpdateController::new(transport);
        let mut dom = page();

        controller.submit(&mut dom, &request(), UpdateOptions::new()).await;
        controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        assert!(dom.messages_of("errorMessages").is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_renders_generic_and_unlocks() {
        let transport = StaticTransport::new();
        transport.push_error(TransportError::Connection("refused".into()));
        let controller = UpdateController::new(transport);
        let mut dom = page();

        let outcome = controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        assert!(outcome.transport_failed);
        assert!(outcome.patched.is_empty());
        assert_eq!(dom.html_of("orderSummary"), Some("<div>stale</div>"));
        let messages = dom.messages_of("errorMessages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, MessageSeverity::System);
        assert_eq!(messages[0].1, TRANSPORT_FAILURE_MESSAGE);
        assert_eq!(dom.is_disabled("submitButton"), Some(false));
    }

    #[tokio::test]
    async fn test_already_disabled_elements_stay_disabled() {
        let transport = StaticTransport::new();
        transport.push_envelope(clean_envelope());
        let controller = UpdateController::new(transport);
        let mut dom = MemoryDocument::new()
            .with_container("errorMessages", "")
            .with_disabled_interactive("legacyButton", "checkoutForm")
            .with_interactive("submitButton", "checkoutForm");

        controller.submit(&mut dom, &request(), UpdateOptions::new()).await;

        // Only elements this invocation disabled are re-enabled.
        assert_eq!(dom.is_disabled("legacyButton"), Some(true));
        assert_eq!(dom.is_disabled("submitButton"), Some(false));
    }

    #[tokio::test]
    async fn test_custom_success_callback_overrides_default() {
        let transport = StaticTransport::new();
        transport.push_envelope(clean_envelope());
        let controller = UpdateController::new(transport);
        let mut dom = page();

        let options = UpdateOptions::new().on_success(Box::new(|envelope, dom: &mut MemoryDocument| {
            dom.replace_subtree("orderSummary", &format!("<div>{} keys</div>", envelope.html().len()));
        }));
        controller.submit(&mut dom, &request(), options).await;

        assert_eq!(dom.html_of("orderSummary"), Some("<div>2 keys</div>"));
        // Default patching did not run for the unknown key either.
        assert_eq!(dom.is_disabled("submitButton"), Some(false));
    }
}
