//! The built-in template catalogue.
//!
//! Templates are defined in `templates.toml` and embedded in the binary at
//! compile time.

use serde::Deserialize;
use tracing::{debug, info};

use skillshare_db::models::{Plan, SYSTEM_OWNER};

use super::payload::PlanRequest;
use super::service::PlanService;
use crate::error::Result;
use crate::store::PlanStore;

#[derive(Debug, Deserialize)]
struct Catalogue {
    templates: Vec<PlanRequest>,
}

static CATALOGUE_TOML: &str = include_str!("templates.toml");

/// Load the template definitions from the embedded catalogue.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed. This is a compile-time invariant
/// -- if the binary was built, the TOML is valid.
pub fn load_catalogue() -> Vec<PlanRequest> {
    let catalogue: Catalogue =
        toml::from_str(CATALOGUE_TOML).expect("embedded templates.toml is invalid");
    catalogue.templates
}

/// Insert the catalogue as system-owned templates.
///
/// Does nothing if the store already holds any template. Returns the
/// templates that were created.
pub async fn seed_templates<S: PlanStore>(service: &PlanService<S>) -> Result<Vec<Plan>> {
    let existing = service.store().list_templates().await?;
    if !existing.is_empty() {
        debug!(count = existing.len(), "templates already present, skipping seed");
        return Ok(Vec::new());
    }

    let mut created = Vec::new();
    for request in load_catalogue() {
        created.push(service.create(SYSTEM_OWNER, &request).await?);
    }
    info!(count = created.len(), "seeded template catalogue");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_parses_and_validates() {
        let templates = load_catalogue();
        assert_eq!(templates.len(), 2);
        for t in &templates {
            assert!(t.template);
            t.validate().expect("catalogue entry should validate");
        }
    }

    #[test]
    fn catalogue_shape() {
        let templates = load_catalogue();
        let java = &templates[0];
        assert_eq!(java.plan.title, "Java Development Learning Path");
        assert_eq!(java.plan.estimated_hours, 120);
        assert_eq!(java.modules.len(), 2);
        let minutes: Vec<i32> = java.modules[0].tasks.iter().map(|t| t.estimated_minutes).collect();
        assert_eq!(minutes, vec![120, 180]);
        assert_eq!(java.modules[1].tasks[1].resources.len(), 2);

        let spring = &templates[1];
        assert_eq!(spring.plan.category.as_deref(), Some("Web Development"));
        assert_eq!(spring.modules.len(), 1);
        assert_eq!(spring.modules[0].tasks.len(), 2);
    }
}
