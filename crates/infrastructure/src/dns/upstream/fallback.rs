use super::UpstreamGroupBuilder;
use sluice_dns_application::ports::{UpstreamGroup, UpstreamGroupProvider, UpstreamOptions};
use sluice_dns_domain::{DomainError, UpstreamGroupKind};
use std::sync::Arc;

/// Fallback servers, used when every main upstream fails.
pub struct FallbackUpstreams {
    lines: Vec<String>,
    builder: UpstreamGroupBuilder,
}

impl FallbackUpstreams {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            builder: UpstreamGroupBuilder::new(),
        }
    }
}

impl UpstreamGroupProvider for FallbackUpstreams {
    fn build(&self, options: &UpstreamOptions) -> Result<Arc<dyn UpstreamGroup>, DomainError> {
        Ok(Arc::new(self.builder.build_group(
            UpstreamGroupKind::Fallback,
            &self.lines,
            options,
        )?))
    }
}
