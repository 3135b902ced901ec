//! Built-in tool implementations for Codeforge.
//!
//! These four tools are the agent's entire action surface on the sandbox:
//! run a command, write files, read files, list a directory. Handlers
//! return failures as error-bearing results so the agent can react; none of
//! them can terminate a run.

pub mod create_files;
pub mod list_files;
pub mod read_files;
pub mod terminal;

pub use create_files::CreateOrUpdateFilesTool;
pub use list_files::ListFilesTool;
pub use read_files::ReadFilesTool;
pub use terminal::TerminalTool;

use codeforge_core::error::ToolError;
use codeforge_core::tool::ToolRegistry;

/// Create the default tool registry with all built-in tools.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TerminalTool))?;
    registry.register(Box::new(CreateOrUpdateFilesTool))?;
    registry.register(Box::new(ReadFilesTool))?;
    registry.register(Box::new(ListFilesTool))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_all_four_tools() {
        let registry = default_registry().unwrap();
        let mut names = registry.names();
        names.sort();
        assert_eq!(
            names,
            vec![
                "create_or_update_files",
                "list_files",
                "read_files",
                "terminal"
            ]
        );
    }

    #[test]
    fn definitions_have_schemas() {
        let registry = default_registry().unwrap();
        for def in registry.definitions() {
            assert!(!def.description.is_empty(), "{} lacks description", def.name);
            assert_eq!(def.parameters["type"], "object");
        }
    }
}
