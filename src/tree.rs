use crate::importer::{Library, Task};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// A task together with its subtasks.
///
/// `children` is `None` for a task without subtasks and is then left out of the
/// JSON entirely; it is never `Some` of an empty vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TaskNode>>,
}

impl TaskNode {
    pub fn leaf(task: Task) -> Self {
        Self {
            task,
            children: None,
        }
    }

    pub fn children(&self) -> &[TaskNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Number of tasks in this subtree, this one included.
    pub fn task_count(&self) -> usize {
        1 + self.children().iter().map(TaskNode::task_count).sum::<usize>()
    }
}

/// Load every task of a list with its subtasks attached, in display order.
///
/// Subtasks are only reachable through their single `ZPARENTTASK` reference,
/// so the descent visits each task row at most once.
pub fn build_task_tree(library: &Library, list_id: i64) -> Result<Vec<TaskNode>> {
    let mut roots: Vec<TaskNode> = library
        .top_level_tasks(list_id)?
        .into_iter()
        .map(TaskNode::leaf)
        .collect();

    for node in &mut roots {
        attach_subtasks(library, node)?;
    }
    Ok(roots)
}

fn attach_subtasks(library: &Library, node: &mut TaskNode) -> Result<()> {
    let subtasks = library.subtasks(node.task.id)?;
    if subtasks.is_empty() {
        return Ok(());
    }

    let mut children = Vec::with_capacity(subtasks.len());
    for task in subtasks {
        let mut child = TaskNode::leaf(task);
        attach_subtasks(library, &mut child)?;
        children.push(child);
    }
    node.children = Some(children);
    Ok(())
}

/// Total number of tasks across a forest.
pub fn count_tasks(nodes: &[TaskNode]) -> usize {
    nodes.iter().map(TaskNode::task_count).sum()
}
