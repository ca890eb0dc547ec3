//! The server-side pipeline driver.

use reflow_core::{
    Command, CommandLifecycle, ErrorAggregator, FragmentRenderer, RequestContext, SystemFault,
};
use reflow_envelope::{EnvelopeBuilder, ResponseEnvelope};
use reflow_executor::{OptionalOperationRegistry, RunConfig, RunReport};
use reflow_observability::{request_span, TracingObserver};

/// Finalize adapter running the optional operation set.
struct RegistrySteps<'a> {
    registry: &'a OptionalOperationRegistry,
    config: RunConfig,
    report: Option<RunReport>,
}

impl reflow_core::FinalizeSteps for RegistrySteps<'_> {
    fn run(&mut self, ctx: &RequestContext, errors: &mut ErrorAggregator) {
        // A config naming unknown operations is a wiring mistake; record it,
        // the run itself still happens with the stray overrides inert.
        if let Err(error) = self.registry.validate_config(&self.config) {
            errors.add_system_fault(SystemFault::internal(anyhow::Error::new(error)));
        }
        self.report = Some(self.registry.run(&self.config, ctx, errors));
    }
}

/// Drive one request through the whole pipeline.
///
/// Validates, gates, conditionally executes the primary operation, runs the
/// optional operation set, compiles fragments when the request is
/// fault-free, and builds the envelope. Exactly one envelope is produced
/// whatever happened along the way.
pub fn handle_request<C: Command>(
    command: C,
    ctx: RequestContext,
    registry: &OptionalOperationRegistry,
    run_config: RunConfig,
    renderer: &dyn FragmentRenderer,
    metadata: serde_json::Value,
) -> ResponseEnvelope {
    let span = request_span(ctx.request_id(), command.name());
    let _guard = span.enter();

    let observer = TracingObserver::new(ctx.request_id().clone());
    let mut lifecycle = CommandLifecycle::new(command, ctx).with_observer(Box::new(observer));

    let mut steps = RegistrySteps {
        registry,
        config: run_config,
        report: None,
    };
    // The lifecycle is fresh, so transitions cannot be out of order; if the
    // impossible happens it is recorded like any other fault.
    if let Err(error) = lifecycle.run_to_completion(&mut steps) {
        lifecycle
            .errors_mut()
            .add_system_fault(SystemFault::internal(anyhow::Error::new(error)));
    }

    if let Some(report) = &steps.report {
        tracing::debug!(operations = %report.as_json(), "optional operations finished");
    }

    let (command, ctx, mut errors) = lifecycle.into_parts();

    let mut builder = EnvelopeBuilder::new().metadata(metadata);
    // Fragment compilation is bypassed for faulted requests: the client
    // observes the error state through an empty or partial `html` object.
    if !errors.has_errors() {
        builder = builder.data(command.payload_data(&ctx));
        for spec in command.fragments(&ctx) {
            match renderer.render(&spec, &ctx) {
                Ok(html) => builder = builder.fragment(spec.key, html),
                Err(cause) => {
                    errors.add_system_fault(SystemFault::internal(cause));
                    break;
                }
            }
        }
    }

    let envelope = builder.build(&errors);
    tracing::info!(
        fragments = envelope.html().len(),
        application_errors = envelope.application_errors().len(),
        system_errors = envelope.system_errors().len(),
        "envelope built"
    );
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use reflow_core::{ApplicationError, FragmentSpec};
    use reflow_executor::OperationSpec;

    struct EchoRenderer;

    impl FragmentRenderer for EchoRenderer {
        fn render(&self, spec: &FragmentSpec, _ctx: &RequestContext) -> anyhow::Result<String> {
            if spec.view == "broken" {
                return Err(anyhow!("template missing"));
            }
            Ok(format!("<div>{}</div>", spec.view))
        }
    }

    #[derive(Default)]
    struct Widget {
        reject: bool,
        broken_view: bool,
        executed: bool,
    }

    impl Command for Widget {
        fn name(&self) -> &str {
            "widget"
        }

        fn validate(
            &mut self,
            _ctx: &RequestContext,
            errors: &mut ErrorAggregator,
        ) -> anyhow::Result<()> {
            if self.reject {
                errors.add_application_error(ApplicationError::new("widget.bad", "bad widget"));
            }
            Ok(())
        }

        fn execute(&mut self, _ctx: &RequestContext) -> anyhow::Result<()> {
            self.executed = true;
            Ok(())
        }

        fn fragments(&self, _ctx: &RequestContext) -> Vec<FragmentSpec> {
            let badge_view = if self.broken_view { "broken" } else { "widget/badge" };
            vec![
                FragmentSpec::new("widgetBody", "widget/body"),
                FragmentSpec::new("widgetBadge", badge_view),
            ]
        }

        fn payload_data(&self, _ctx: &RequestContext) -> serde_json::Value {
            serde_json::json!({"executed": self.executed})
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::builder(http::Method::POST, "/widget").build()
    }

    #[test]
    fn test_clean_request_compiles_fragments() {
        let registry = OptionalOperationRegistry::new();
        let envelope = handle_request(
            Widget::default(),
            ctx(),
            &registry,
            RunConfig::new(),
            &EchoRenderer,
            serde_json::json!({"command": "widget"}),
        );

        assert!(!envelope.has_errors());
        assert_eq!(envelope.fragment("widgetBody"), Some("<div>widget/body</div>"));
        assert_eq!(envelope.fragment("widgetBadge"), Some("<div>widget/badge</div>"));
        assert_eq!(envelope.data()["executed"], true);
    }

    #[test]
    fn test_faulted_request_bypasses_renderer() {
        let registry = OptionalOperationRegistry::new();
        let envelope = handle_request(
            Widget {
                reject: true,
                ..Widget::default()
            },
            ctx(),
            &registry,
            RunConfig::new(),
            &EchoRenderer,
            serde_json::Value::Null,
        );

        assert!(envelope.has_errors());
        assert!(envelope.html().is_empty());
        assert_eq!(envelope.data(), &serde_json::Value::Null);
        assert_eq!(envelope.application_errors(), &["bad widget".to_string()]);
    }

    #[test]
    fn test_render_fault_leaves_partial_html() {
        let registry = OptionalOperationRegistry::new();
        let envelope = handle_request(
            Widget {
                broken_view: true,
                ..Widget::default()
            },
            ctx(),
            &registry,
            RunConfig::new(),
            &EchoRenderer,
            serde_json::Value::Null,
        );

        assert!(envelope.has_errors());
        // The fragment compiled before the fault is kept; later keys are not.
        assert_eq!(envelope.fragment("widgetBody"), Some("<div>widget/body</div>"));
        assert_eq!(envelope.fragment("widgetBadge"), None);
        assert_eq!(envelope.system_errors().len(), 1);
    }

    #[test]
    fn test_optional_operations_run_even_when_gated_closed() {
        let mut registry = OptionalOperationRegistry::new();
        registry
            .register(
                OperationSpec::new(
                    "audit",
                    |_: &RequestContext, _: &mut ErrorAggregator| -> anyhow::Result<()> { Ok(()) },
                )
                .enabled_by_default(true),
            )
            .unwrap();

        // Even a rejected request still produces exactly one envelope and
        // still runs finalize; the audit operation leaves no fault behind.
        let envelope = handle_request(
            Widget {
                reject: true,
                ..Widget::default()
            },
            ctx(),
            &registry,
            RunConfig::new(),
            &EchoRenderer,
            serde_json::Value::Null,
        );

        assert!(envelope.system_errors().is_empty());
        assert_eq!(envelope.application_errors().len(), 1);
    }

    #[test]
    fn test_unknown_override_is_recorded_as_fault() {
        let registry = OptionalOperationRegistry::new();
        let envelope = handle_request(
            Widget::default(),
            ctx(),
            &registry,
            RunConfig::new().disable("nonexistent"),
            &EchoRenderer,
            serde_json::Value::Null,
        );

        assert!(envelope.has_errors());
        assert_eq!(envelope.system_errors().len(), 1);
    }
}
