mod config;
mod plan_cmds;
mod recipe_cmds;
mod tui;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use mealplan_core::MealDbClient;
use mealplan_store::{Category, KeyValueStore, MemoryStore, PlanStore};

use config::MealplanConfig;

#[derive(Parser)]
#[command(name = "mealplan", version, about = "Terminal meal planner with recipe search")]
struct Cli {
    /// Directory holding the stored plan (overrides MEALPLAN_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Recipe API base URL (overrides MEALPLAN_RECIPE_API)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Keep the plan in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the plan grouped by category
    Show {
        /// Print the stored JSON document instead
        #[arg(long)]
        json: bool,
    },
    /// Add a meal to a category
    Add {
        /// breakfast, lunch, dinner or snack
        category: Category,
        /// Meal name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Link the entry to a recipe id
        #[arg(long)]
        recipe_ref: Option<String>,
    },
    /// Rename a meal
    Rename {
        category: Category,
        /// Entry id (as printed by `show`)
        id: String,
        /// New name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Remove a meal (no-op if the id is unknown)
    Remove { category: Category, id: String },
    /// Remove every meal from the plan
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Search recipes by name
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show a recipe's ingredients and instructions
    Recipe {
        /// Recipe id
        id: String,
    },
    /// Look up a recipe and add it to the plan
    Import {
        /// Recipe id
        recipe_id: String,
        /// Category to add the recipe to
        #[arg(long, default_value = "breakfast")]
        category: Category,
    },
    /// Launch the interactive dashboard
    Dashboard,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Execute the `mealplan init` command: write config file.
fn cmd_init(cli: &Cli, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        storage: config::StorageSection {
            data_dir: cli.data_dir.clone(),
        },
        recipes: config::RecipesSection {
            api_base: cli.api_base.clone(),
            timeout_secs: None,
        },
    };

    config::save_config(&cfg)?;

    let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
    println!("Config written to {}", path.display());
    println!("  storage.data_dir = {}", resolved.store.data_dir.display());
    println!("  recipes.api_base = {}", resolved.recipes.base_url);

    Ok(())
}

/// Open the plan store named by the resolved config.
fn open_store(
    resolved: &MealplanConfig,
    ephemeral: bool,
) -> PlanStore<Box<dyn KeyValueStore>> {
    let storage: Box<dyn KeyValueStore> = if ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(resolved.store.file_store())
    };
    PlanStore::open(storage)
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log lines would corrupt the dashboard's alternate screen.
    let default_level = match cli.command {
        Commands::Dashboard => "off",
        _ => "warn",
    };
    init_tracing(default_level);

    match &cli.command {
        Commands::Init { force } => {
            cmd_init(&cli, *force)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "mealplan", &mut io::stdout());
        }
        Commands::Show { json } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let store = open_store(&resolved, cli.ephemeral);
            plan_cmds::run_show(&store, *json)?;
        }
        Commands::Add {
            category,
            name,
            recipe_ref,
        } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let mut store = open_store(&resolved, cli.ephemeral);
            plan_cmds::run_add(&mut store, *category, &name.join(" "), recipe_ref.clone())?;
        }
        Commands::Rename { category, id, name } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let mut store = open_store(&resolved, cli.ephemeral);
            plan_cmds::run_rename(&mut store, *category, id, &name.join(" "))?;
        }
        Commands::Remove { category, id } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let mut store = open_store(&resolved, cli.ephemeral);
            plan_cmds::run_remove(&mut store, *category, id)?;
        }
        Commands::Clear { yes } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let mut store = open_store(&resolved, cli.ephemeral);
            if *yes {
                plan_cmds::run_clear(&mut store, &mut |_: &str| true)?;
            } else {
                plan_cmds::run_clear(&mut store, &mut plan_cmds::StdinConfirm)?;
            }
        }
        Commands::Search { query } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let client = MealDbClient::new(resolved.recipes)?;
            recipe_cmds::run_search(&client, &query.join(" ")).await?;
        }
        Commands::Recipe { id } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let client = MealDbClient::new(resolved.recipes)?;
            recipe_cmds::run_recipe(&client, id).await?;
        }
        Commands::Import {
            recipe_id,
            category,
        } => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let mut store = open_store(&resolved, cli.ephemeral);
            let client = MealDbClient::new(resolved.recipes)?;
            recipe_cmds::run_import(&client, &mut store, recipe_id, *category).await?;
        }
        Commands::Dashboard => {
            let resolved = MealplanConfig::resolve(cli.data_dir.as_deref(), cli.api_base.as_deref())?;
            let store = open_store(&resolved, cli.ephemeral);
            let client = MealDbClient::new(resolved.recipes)?;
            tui::run_dashboard(store, std::sync::Arc::new(client)).await?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_multi_word_names_and_categories() {
        let cli = Cli::try_parse_from(["mealplan", "add", "LUNCH", "Chicken", "Handi"]).unwrap();
        match cli.command {
            Commands::Add { category, name, .. } => {
                assert_eq!(category, Category::Lunch);
                assert_eq!(name.join(" "), "Chicken Handi");
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn cli_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["mealplan", "add", "brunch", "Eggs"]).is_err());
    }

    #[test]
    fn import_defaults_to_breakfast() {
        let cli = Cli::try_parse_from(["mealplan", "--ephemeral", "import", "52772"]).unwrap();
        assert!(cli.ephemeral);
        match cli.command {
            Commands::Import { category, .. } => assert_eq!(category, Category::Breakfast),
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
