//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::DbContext;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = DbContext::new(&settings.database_url());
    let applied = ctx.init_schema().await?;

    for name in &applied {
        println!("  {} Applied migration {}", style("✓").green(), name);
    }

    println!(
        "{} Initialized marginalia in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Documents stored under {}", settings.documents_dir.display());

    Ok(())
}
