//! Learning plans: payloads, progress rollups, template cloning, and the
//! lifecycle service.

pub mod aggregate;
pub mod clone;
pub mod payload;
pub mod service;
pub mod templates;

pub use aggregate::{ProgressSummary, recompute_all, recompute_module, recompute_plan};
pub use clone::clone_template;
pub use payload::{PayloadError, PlanMetadata, PlanRequest, parse_plan_toml};
pub use service::{PlanFilter, PlanService, TemplateSummary};
pub use templates::{load_catalogue, seed_templates};
