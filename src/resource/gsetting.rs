//! GSettings resource - desktop settings of the primary user

use anyhow::Result;

use super::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState, dry_run_skip};
use crate::privilege;
use crate::schema::GSetting;

/// A gsettings key set in the user's own session bus
#[derive(Debug, Clone)]
pub struct GSettingResource {
    pub user: String,
    pub setting: GSetting,
}

impl GSettingResource {
    pub fn new(user: &str, setting: &GSetting) -> Self {
        Self {
            user: user.to_string(),
            setting: setting.clone(),
        }
    }

    /// `gsettings <verb> ...` run as the user under a throwaway session bus
    fn gsettings(&self, args: &[&str]) -> Invocation {
        let mut full = vec!["gsettings"];
        full.extend_from_slice(args);
        privilege::as_user(&self.user, Invocation::new("dbus-launch", full))
    }
}

impl Resource for GSettingResource {
    fn id(&self) -> String {
        format!("{}.{}", self.setting.schema, self.setting.key)
    }

    fn description(&self) -> String {
        format!(
            "Set {} {} for {}",
            self.setting.schema, self.setting.key, self.user
        )
    }

    fn resource_type(&self) -> &'static str {
        "gsetting"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let invocation = self
            .gsettings(&["get", &self.setting.schema, &self.setting.key])
            .read_only();
        let current = ctx.exec.capture(&invocation)?;
        let current = current.trim();

        if current == self.setting.value {
            Ok(self.desired_state())
        } else {
            Ok(ResourceState::Modified {
                from: current.to_string(),
                to: self.setting.value.clone(),
            })
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.setting.value.clone()),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        ctx.exec.run(&self.gsettings(&[
            "set",
            &self.setting.schema,
            &self.setting.key,
            &self.setting.value,
        ]))?;
        Ok(ApplyResult::Modified)
    }
}
