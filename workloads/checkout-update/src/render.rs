//! Fragment rendering for the checkout widgets.
//!
//! A deliberately small template collaborator: the pipeline only requires
//! a deterministic `view -> markup` function per command.

use anyhow::anyhow;
use reflow_sdk::reflow_core::{FragmentRenderer, FragmentSpec, RequestContext};

/// Renders the checkout views from request parameters.
#[derive(Debug, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentRenderer for TemplateRenderer {
    fn render(&self, spec: &FragmentSpec, ctx: &RequestContext) -> anyhow::Result<String> {
        match spec.view.as_str() {
            "checkout/shipping_contact" => {
                let first = html_escape(ctx.param("firstName").unwrap_or_default());
                let last = html_escape(ctx.param("lastName").unwrap_or_default());
                let email = html_escape(ctx.param("email").unwrap_or_default());
                Ok(format!(
                    r#"<div class="shipping-contact"><span class="name">{} {}</span><span class="email">{}</span></div>"#,
                    first, last, email
                ))
            }
            "checkout/order_summary" => Ok(format!(
                r#"<div class="order-summary" data-contact="{}">Ships to {}</div>"#,
                html_escape(ctx.param("email").unwrap_or_default()),
                html_escape(ctx.param("firstName").unwrap_or_default()),
            )),
            other => Err(anyhow!("unknown view '{}'", other)),
        }
    }
}

/// Escape text interpolated into markup.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::builder(http::Method::POST, "/checkout/shipping-contact")
            .param("firstName", "Ada")
            .param("lastName", "Lovelace & Co")
            .param("email", "ada@example.com")
            .build()
    }

    #[test]
    fn test_renders_contact_with_escaping() {
        let markup = TemplateRenderer::new()
            .render(&FragmentSpec::new("shippingContact", "checkout/shipping_contact"), &ctx())
            .unwrap();
        assert!(markup.contains("Ada Lovelace &amp; Co"));
        assert!(markup.contains("ada@example.com"));
    }

    #[test]
    fn test_unknown_view_is_a_fault() {
        let result = TemplateRenderer::new()
            .render(&FragmentSpec::new("key", "checkout/not_a_view"), &ctx());
        assert!(result.is_err());
    }
}
