use crate::errors::Error;
use crate::http::{ArgumentSet, Context, Response};
use crate::name::{Namespace, ResourceName};
use crate::Result;

/// Everything needed to address one REST resource: the context that sends requests, the namespace and the name.
#[derive(Debug, Clone)]
pub struct ResourceIdentity {
    context: Context,
    namespace: Namespace,
    name: ResourceName,
}

impl ResourceIdentity {
    /// Creates the identity of `name` in `namespace`.
    pub fn new(context: Context, namespace: Namespace, name: ResourceName) -> Self {
        Self {
            context,
            namespace,
            name,
        }
    }

    /// The context requests are sent through.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The namespace of the resource.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The name of the resource.
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// The last segment of the name.
    pub fn title(&self) -> &str {
        self.name.title()
    }

    /// The identity of a resource below this one, in the same namespace.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        Ok(Self::new(self.context.clone(), self.namespace.clone(), self.name.join(segment)?))
    }

    /// Fails unless the namespace names a concrete user and app, or is the default one.
    pub(crate) fn ensure_specific(&self) -> Result<()> {
        if self.namespace.is_specific() {
            Ok(())
        } else {
            Err(Error::invalid_operation(format!(
                "{} cannot be addressed in wildcard namespace {}",
                self.name, self.namespace
            )))
        }
    }

    pub(crate) async fn get(&self, args: &ArgumentSet) -> Result<Response> {
        self.context.get(&self.namespace, &self.name, args).await
    }

    pub(crate) async fn post(&self, args: &ArgumentSet) -> Result<Response> {
        self.context.post(&self.namespace, &self.name, args).await
    }

    pub(crate) async fn delete(&self) -> Result<Response> {
        self.context.delete(&self.namespace, &self.name, &ArgumentSet::new()).await
    }
}
