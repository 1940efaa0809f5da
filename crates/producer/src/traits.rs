//! Interface over the template producer.

use std::future::Future;

use serde_json::Value;

use crate::{errors::ProducerResult, response::UnsignedPackage};

/// Produces the unsigned commit and spell templates for a request.
pub trait TemplateProducer: Send + Sync {
    /// Asks for the templates described by `request`.
    fn produce(&self, request: &Value) -> impl Future<Output = ProducerResult<UnsignedPackage>> + Send;
}
