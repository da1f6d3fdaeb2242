use std::sync::Arc;

use crate::domains::posts::DevToClient;
use crate::domains::seo::{DashboardState, RelatedPostSources};
use crate::kernel::ServerDeps;

/// GraphQL request context
///
/// Contains shared resources available to all resolvers
#[derive(Clone)]
pub struct GraphQLContext {
    pub deps: Arc<ServerDeps>,
    pub dashboard: Arc<DashboardState>,
    pub related_sources: Arc<RelatedPostSources>,
    pub devto: Arc<DevToClient>,
}

impl juniper::Context for GraphQLContext {}

impl GraphQLContext {
    pub fn new(
        deps: Arc<ServerDeps>,
        dashboard: Arc<DashboardState>,
        related_sources: Arc<RelatedPostSources>,
        devto: Arc<DevToClient>,
    ) -> Self {
        Self {
            deps,
            dashboard,
            related_sources,
            devto,
        }
    }
}
