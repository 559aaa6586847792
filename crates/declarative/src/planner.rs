//! Execution planner - builds ordered resource execution plans

use crate::resource::{BoxedResource, Resource};

/// An execution plan: resources applied strictly in insertion order
pub struct ExecutionPlan {
    pub resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Append a resource to the end of the plan
    pub fn push(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            resources: self
                .resources
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name". The name part is matched as a
    /// substring of the resource id, so it may itself contain dots.
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type, name))
            }
        }
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('.') {
        Some((resource_type, name)) => (resource_type, Some(name)),
        None => (target, None),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(resource: &dyn Resource, resource_type: &str, name: Option<&str>) -> bool {
    // Allow common aliases
    let matches_type = match resource_type {
        "packages" => resource.resource_type() == "pacman_packages",
        "flatpaks" | "apps" => resource.resource_type() == "flatpak_app",
        "symlinks" => resource.resource_type() == "symlink",
        "files" => resource.resource_type() == "managed_file",
        rt => resource.resource_type() == rt || resource.resource_type().starts_with(rt),
    };
    if !matches_type {
        return false;
    }

    if let Some(n) = name
        && !resource.id().contains(n)
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::{ApplyResult, ResourceState};
    use anyhow::Result;

    #[derive(Debug)]
    struct Named(&'static str, &'static str);

    impl Resource for Named {
        fn id(&self) -> String {
            self.1.to_string()
        }
        fn description(&self) -> String {
            self.1.to_string()
        }
        fn resource_type(&self) -> &'static str {
            self.0
        }
        fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
            Ok(ResourceState::Unknown)
        }
        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }
        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    fn sample_plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        plan.push(Box::new(Named("pacman_repository", "multilib")));
        plan.push(Box::new(Named("flatpak_app", "com.spotify.Client")));
        plan.push(Box::new(Named("flatpak_app", "com.discordapp.Discord")));
        plan
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("flatpak_app"), ("flatpak_app", None));
        assert_eq!(
            parse_target("flatpak_app.com.spotify.Client"),
            ("flatpak_app", Some("com.spotify.Client"))
        );
    }

    #[test]
    fn test_filter_by_alias_and_name() {
        let plan = sample_plan().filter_by_target(Some("apps.spotify"));
        assert_eq!(plan.total_resources(), 1);
        assert_eq!(plan.resources[0].id(), "com.spotify.Client");
    }

    #[test]
    fn test_filter_by_type_prefix_keeps_order() {
        let plan = sample_plan().filter_by_target(Some("flatpak"));
        let ids: Vec<String> = plan.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["com.spotify.Client", "com.discordapp.Discord"]);
    }

    #[test]
    fn test_no_target_keeps_everything() {
        assert_eq!(sample_plan().filter_by_target(None).total_resources(), 3);
    }
}
