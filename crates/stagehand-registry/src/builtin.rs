//! Built-in standalone registration set.
//!
//! A minimal, self-contained configuration used by the CLI's demo mode and
//! by integration tests: the always-on capabilities plus the well-known
//! infrastructure nodes, all backed by echo-style components. Real
//! deployments supply their own sets (or extend this one).

use crate::record::{Category, Registration, RegistrationSet};
use serde_json::json;
use stagehand_core::{Component, ComponentCall, ComponentKind, ComponentResult, Result};
use std::sync::Arc;

/// Echo-style component: reports its identity, objective, and inputs.
struct EchoComponent {
    name: &'static str,
    description: &'static str,
    kind: ComponentKind,
    provides: Vec<String>,
}

#[async_trait::async_trait]
impl Component for EchoComponent {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn provides(&self) -> Vec<String> {
        self.provides.clone()
    }

    async fn execute(&self, call: ComponentCall) -> ComponentResult {
        Ok(json!({
            "component": self.name,
            "objective": call.objective,
            "inputs": call.inputs.keys().collect::<Vec<_>>(),
        }))
    }
}

fn echo(
    name: &'static str,
    description: &'static str,
    kind: ComponentKind,
    provides: &[&str],
) -> Registration {
    let provides: Vec<String> = provides.iter().map(|s| s.to_string()).collect();
    let reg_provides = provides.clone();
    Registration::new(name, move || -> Result<Arc<dyn Component>> {
        Ok(Arc::new(EchoComponent {
            name,
            description,
            kind,
            provides: provides.clone(),
        }))
    })
    .provides(reg_provides)
}

/// The default standalone set: respond/clarify capabilities and the five
/// well-known infrastructure nodes.
pub fn default_standalone_set() -> RegistrationSet {
    let mut set = RegistrationSet::new();

    set.add(
        Category::Capabilities,
        echo(
            "respond",
            "Produce the final reply for the current task",
            ComponentKind::Standard,
            &["reply"],
        )
        .always_active(),
    );
    set.add(
        Category::Capabilities,
        echo(
            "clarify",
            "Ask the user a clarifying question",
            ComponentKind::Standard,
            &["question"],
        )
        .always_active(),
    );

    set.add(
        Category::Infrastructure,
        echo(
            "router",
            "Route an incoming task to a capability",
            ComponentKind::Infrastructure,
            &["route"],
        ),
    );
    set.add(
        Category::Infrastructure,
        echo(
            "classifier",
            "Classify the incoming task",
            ComponentKind::Infrastructure,
            &["task_class"],
        ),
    );
    set.add(
        Category::Infrastructure,
        echo(
            "planner",
            "Produce an execution plan for a task",
            ComponentKind::Infrastructure,
            &["plan"],
        ),
    );
    set.add(
        Category::Infrastructure,
        echo(
            "error-handler",
            "Summarize a failed run for the user",
            ComponentKind::Infrastructure,
            &["error_report"],
        ),
    );
    set.add(
        Category::Infrastructure,
        echo(
            "task-extractor",
            "Extract the actionable task from a request",
            ComponentKind::Infrastructure,
            &["task"],
        ),
    );

    set
}
