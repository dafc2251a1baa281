//! Cache key scheme.

const TODO_KEY_PREFIX: &str = "todo:todo-key";

/// Key under which a single todo is mirrored.
pub fn todo_key(id: i64) -> String {
    format!("{TODO_KEY_PREFIX}:{id}")
}
