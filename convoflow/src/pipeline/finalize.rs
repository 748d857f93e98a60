//! One-time tree finalization.
//!
//! Construction and naming are two phases: users assemble the component
//! tree freely, then a single recursive pass assigns sibling-unique
//! names and globally unique dot-separated paths, validating as it
//! goes. Finalized paths are what the execution-state store is keyed by.

use crate::errors::BuildError;
use crate::service::{Component, ServiceGroup};
use std::collections::HashSet;

fn validate_name(name: &str) -> Result<(), BuildError> {
    if name.is_empty() || name.contains('.') {
        return Err(BuildError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn auto_name(component: &Component, index: usize) -> String {
    match component {
        Component::Service(service) if service.is_actor() => "actor".to_string(),
        Component::Service(_) => format!("service_{index}"),
        Component::Group(_) => format!("group_{index}"),
    }
}

/// Walks a group, assigning names and paths to every descendant.
///
/// Returns the number of actor components found in the subtree.
pub(crate) fn finalize_group(group: &mut ServiceGroup, path: &str) -> Result<usize, BuildError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut actors = 0;

    for (index, child) in group.components_mut().iter_mut().enumerate() {
        let name = match child.core().name.clone() {
            Some(name) => {
                validate_name(&name)?;
                name
            }
            None => auto_name(child, index),
        };
        if !seen.insert(name.clone()) {
            return Err(BuildError::DuplicateName {
                name,
                parent: path.to_string(),
            });
        }

        let child_path = format!("{path}.{name}");
        child.core_mut().name = Some(name);
        child.core_mut().path = child_path.clone();

        match child {
            Component::Service(service) => {
                if service.is_actor() {
                    actors += 1;
                }
            }
            Component::Group(nested) => {
                actors += finalize_group(nested, &child_path)?;
            }
        }
    }

    Ok(actors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Node, Script, ScriptActor};
    use crate::service::Service;

    fn noop_service() -> Service {
        Service::from_fn(|_| Ok(()))
    }

    fn actor_service() -> Service {
        let script = Script::new().with_node(("flow", "start"), Node::new("ack"));
        Service::actor(ScriptActor::new(script))
    }

    #[test]
    fn test_paths_are_assigned_depth_first() {
        let mut root = ServiceGroup::new(vec![
            noop_service().into(),
            ServiceGroup::new(vec![noop_service().with_name("inner").into()])
                .with_name("prep")
                .into(),
            actor_service().into(),
        ]);

        let actors = finalize_group(&mut root, ".pipeline").unwrap();
        assert_eq!(actors, 1);

        let paths: Vec<String> = root
            .components()
            .iter()
            .map(|component| component.path().to_string())
            .collect();
        assert_eq!(paths, vec![".pipeline.service_0", ".pipeline.prep", ".pipeline.actor"]);

        let Component::Group(prep) = &root.components()[1] else {
            panic!("expected a group");
        };
        assert_eq!(prep.components()[0].path(), ".pipeline.prep.inner");
    }

    #[test]
    fn test_duplicate_sibling_names_fail() {
        let mut root = ServiceGroup::new(vec![
            noop_service().with_name("db").into(),
            noop_service().with_name("db").into(),
        ]);

        let err = finalize_group(&mut root, ".pipeline").unwrap_err();
        assert!(matches!(err, BuildError::DuplicateName { .. }));
    }

    #[test]
    fn test_blank_and_dotted_names_fail() {
        let mut root = ServiceGroup::new(vec![noop_service().with_name("").into()]);
        assert!(matches!(
            finalize_group(&mut root, ".pipeline").unwrap_err(),
            BuildError::InvalidName { .. }
        ));

        let mut root = ServiceGroup::new(vec![noop_service().with_name("a.b").into()]);
        assert!(matches!(
            finalize_group(&mut root, ".pipeline").unwrap_err(),
            BuildError::InvalidName { .. }
        ));
    }

    #[test]
    fn test_actor_count_covers_nested_groups() {
        let mut root = ServiceGroup::new(vec![
            ServiceGroup::new(vec![actor_service().into()]).into(),
            actor_service().with_name("second_actor").into(),
        ]);

        let actors = finalize_group(&mut root, ".pipeline").unwrap();
        assert_eq!(actors, 2);
    }
}
