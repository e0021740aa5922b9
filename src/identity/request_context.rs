use super::Principal;

/// Per-request carrier for the verified principal and request metadata.
/// Downstream handlers scope data access by `principal`, never by
/// client-supplied identity fields.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub request_id: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self { principal: None, request_id: None }
    }
}

impl RequestContext {
    pub fn authenticated(&self) -> bool { self.principal.is_some() }

    /// Subject id of the verified principal, if any.
    pub fn subject_id(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.subject_id.as_str())
    }
}
