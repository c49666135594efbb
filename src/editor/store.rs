use std::future::Future;

use anyhow::Result;
use uuid::Uuid;

use crate::models::template::{TemplateVersion, TemplateVersionCreate};

/// Persistence client for template versions.
///
/// Implemented by whatever talks to the template service; the editor only
/// needs these two round-trips.
pub trait TemplateStore {
    fn create_version(
        &self,
        template_id: Uuid,
        payload: &TemplateVersionCreate,
    ) -> impl Future<Output = Result<TemplateVersion>> + Send;

    fn publish_version(
        &self,
        template_id: Uuid,
        version_id: Uuid,
    ) -> impl Future<Output = Result<TemplateVersion>> + Send;
}
