// src/config/validate.rs

use anyhow::{Context, Result, anyhow};
use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RenameRule};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one task
/// - every task has at least one `src` pattern and at least one step
/// - all glob patterns (task `src`/`exclude` and watch bindings) compile
/// - watch bindings either run tasks or request a reload
/// - all task references (`after`, binding `tasks`) refer to existing tasks
/// - the `after` build order has no cycles
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_tasks(cfg)?;
    validate_watch_bindings(cfg)?;
    validate_build_order(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [task.<name>] section"
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.src.is_empty() {
            return Err(anyhow!("task '{name}' has no `src` patterns"));
        }
        if task.steps.is_empty() {
            return Err(anyhow!("task '{name}' has no pipeline steps"));
        }

        for pat in task.src.iter().chain(task.exclude.iter()) {
            Glob::new(pat)
                .with_context(|| format!("invalid glob pattern '{pat}' in task '{name}'"))?;
        }

        if let Some(rename) = &task.rename {
            validate_rename(name, rename)?;
        }

        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(anyhow!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                ));
            }
            if dep == name {
                return Err(anyhow!("task '{name}' cannot depend on itself in `after`"));
            }
        }
    }
    Ok(())
}

fn validate_rename(task: &str, rename: &RenameRule) -> Result<()> {
    if rename.ext.is_none() && rename.suffix.is_none() {
        return Err(anyhow!(
            "task '{task}' has an empty `rename` rule (set `ext` and/or `suffix`)"
        ));
    }
    if let Some(ext) = &rename.ext
        && ext.trim_start_matches('.').is_empty()
    {
        return Err(anyhow!("task '{task}' has an empty `rename.ext`"));
    }
    Ok(())
}

fn validate_watch_bindings(cfg: &ConfigFile) -> Result<()> {
    for (idx, binding) in cfg.watch.iter().enumerate() {
        Glob::new(&binding.glob).with_context(|| {
            format!(
                "invalid glob pattern '{}' in watch binding #{idx}",
                binding.glob
            )
        })?;

        if binding.tasks.is_empty() && !binding.reload {
            return Err(anyhow!(
                "watch binding '{}' has no tasks and reload = false; it would never do anything",
                binding.glob
            ));
        }

        for task in binding.tasks.iter() {
            if !cfg.task.contains_key(task) {
                return Err(anyhow!(
                    "watch binding '{}' references unknown task '{task}'",
                    binding.glob
                ));
            }
        }
    }
    Ok(())
}

fn validate_build_order(cfg: &ConfigFile) -> Result<()> {
    // Build a simple petgraph graph from the tasks and their `after` lists.
    //
    // Edge direction: dep -> task
    // For:
    //   [task.scss]
    //   after = ["css"]
    // we add edge css -> scss.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(anyhow!(
                "cycle detected in task build order involving task '{node}'"
            ))
        }
    }
}

/// Compute the full-build order: all task names, dependency-ordered.
///
/// Assumes the config has already been validated (no cycles).
pub fn build_order(cfg: &ConfigFile) -> Vec<String> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|s| s.to_string()).collect(),
        // Unreachable after validation; fall back to declaration order.
        Err(_) => cfg.task.keys().cloned().collect(),
    }
}
