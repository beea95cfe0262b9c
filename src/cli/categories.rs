use crate::cli::CategoriesArgs;
use crate::config::Config;
use crate::planner::select_categories;
use std::path::Path;

pub fn execute(args: CategoriesArgs, config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path)?;
    config.validate()?;

    let categories = select_categories(&config.categories, &args.companion, &[]);
    if categories.is_empty() {
        anyhow::bail!("No categories configured for companion '{}'", args.companion);
    }

    for category in categories {
        println!("{}", category);
    }
    Ok(())
}
