//! The page abstraction the controller patches.

/// Severity of a rendered error message.
///
/// Application messages are user-actionable; system messages are generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Application,
    System,
}

impl MessageSeverity {
    /// CSS-class style name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSeverity::Application => "application",
            MessageSeverity::System => "system",
        }
    }
}

/// View of the page the controller manipulates.
///
/// Client-rendered containers use the fragment key as their element
/// identifier; that convention is what makes the patch step find them.
pub trait DocumentView {
    /// Whether an element with the given identifier exists.
    fn contains(&self, id: &str) -> bool;

    /// Replace the subtree of the identified element with new markup.
    ///
    /// Returns `false` when no element matches; that is a no-op for the
    /// key, not an error.
    fn replace_subtree(&mut self, id: &str, html: &str) -> bool;

    /// Disable every currently-enabled interactive descendant of every
    /// ajax region, returning exactly the identifiers disabled by this call.
    fn disable_ajax_regions(&mut self) -> Vec<String>;

    /// Re-enable the identified elements.
    fn enable_elements(&mut self, ids: &[String]);

    /// Remove all children of the identified element.
    fn clear_children(&mut self, id: &str);

    /// Append a message element to the identified container.
    fn append_message(&mut self, container_id: &str, severity: MessageSeverity, text: &str);
}

/// One element of the in-memory page model.
#[derive(Debug, Clone)]
pub struct MemoryElement {
    pub id: String,
    pub html: String,
    pub interactive: bool,
    pub disabled: bool,
    /// Identifier of the ajax region this element belongs to, if any.
    pub region: Option<String>,
    pub messages: Vec<(MessageSeverity, String)>,
}

impl MemoryElement {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            html: String::new(),
            interactive: false,
            disabled: false,
            region: None,
            messages: Vec::new(),
        }
    }
}

/// In-memory page for tests and server-side smoke checks.
///
/// Elements are kept in document order.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: Vec<MemoryElement>,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container element (fragment target or message container).
    pub fn with_container(mut self, id: impl Into<String>, html: impl Into<String>) -> Self {
        let mut element = MemoryElement::new(id);
        element.html = html.into();
        self.elements.push(element);
        self
    }

    /// Add an interactive element inside an ajax region.
    pub fn with_interactive(mut self, id: impl Into<String>, region: impl Into<String>) -> Self {
        let mut element = MemoryElement::new(id);
        element.interactive = true;
        element.region = Some(region.into());
        self.elements.push(element);
        self
    }

    /// Add an interactive element that is already disabled.
    pub fn with_disabled_interactive(
        mut self,
        id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        let mut element = MemoryElement::new(id);
        element.interactive = true;
        element.disabled = true;
        element.region = Some(region.into());
        self.elements.push(element);
        self
    }

    /// Add an interactive element outside any ajax region.
    pub fn with_free_interactive(mut self, id: impl Into<String>) -> Self {
        let mut element = MemoryElement::new(id);
        element.interactive = true;
        self.elements.push(element);
        self
    }

    /// Current markup of an element.
    pub fn html_of(&self, id: &str) -> Option<&str> {
        self.find(id).map(|e| e.html.as_str())
    }

    /// Whether an element is disabled.
    pub fn is_disabled(&self, id: &str) -> Option<bool> {
        self.find(id).map(|e| e.disabled)
    }

    /// Messages currently rendered into a container.
    pub fn messages_of(&self, id: &str) -> &[(MessageSeverity, String)] {
        self.find(id).map(|e| e.messages.as_slice()).unwrap_or(&[])
    }

    fn find(&self, id: &str) -> Option<&MemoryElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut MemoryElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }
}

impl DocumentView for MemoryDocument {
    fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    fn replace_subtree(&mut self, id: &str, html: &str) -> bool {
        match self.find_mut(id) {
            Some(element) => {
                element.html = html.to_string();
                true
            }
            None => false,
        }
    }

    fn disable_ajax_regions(&mut self) -> Vec<String> {
        let mut disabled = Vec::new();
        for element in &mut self.elements {
            if element.interactive && !element.disabled && element.region.is_some() {
                element.disabled = true;
                disabled.push(element.id.clone());
            }
        }
        disabled
    }

    fn enable_elements(&mut self, ids: &[String]) {
        for element in &mut self.elements {
            if ids.contains(&element.id) {
                element.disabled = false;
            }
        }
    }

    fn clear_children(&mut self, id: &str) {
        if let Some(element) = self.find_mut(id) {
            element.messages.clear();
            element.html.clear();
        }
    }

    fn append_message(&mut self, container_id: &str, severity: MessageSeverity, text: &str) {
        if let Some(element) = self.find_mut(container_id) {
            element.messages.push((severity, text.to_string()));
        }
    }
}
