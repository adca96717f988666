mod descriptor;
pub mod file;
pub mod html;
pub mod math;
pub mod plot;
mod registry;
pub mod sql;
pub mod table;
pub mod web;

pub use descriptor::{Arguments, ParamKind, Parameter, ReturnKind, ToolDescriptor};
pub use file::{CreateFileTool, CreateFolderTool, WriteFindingsTool};
pub use math::IsPrimeTool;
pub use plot::SavePlotTool;
pub use registry::{ToolOutcome, ToolRegistry};
pub use sql::{ColumnInfoTool, Database, SqlEngineTool};
pub use table::{LoadCsvTool, Table};
pub use web::VisitWebpageTool;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A tool that can be executed by an agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// The contract shown to the reasoning loop
    fn descriptor(&self) -> &ToolDescriptor;

    /// Execute the tool with arguments that already passed validation
    async fn execute(&self, args: &Arguments) -> Result<Value>;

    /// The unique name of this tool
    fn name(&self) -> &str {
        &self.descriptor().name
    }
}
