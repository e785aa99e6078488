use anyhow::Result;

use crate::cli::OutputFormat;
use crate::output::print_buttons;
use crate::runtime::Runtime;

pub async fn buttons(runtime: &Runtime, entity: &str, view: &str, format: OutputFormat) -> Result<()> {
    let buttons = runtime.buttons().load_for_view(entity, view).await?;
    print_buttons(&buttons, format)
}
