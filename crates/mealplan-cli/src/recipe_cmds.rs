//! CLI handlers for the recipe subcommands: `search`, `recipe` and `import`.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};

use mealplan_core::{
    DetailOverlay, PlanView, RecipeDetail, RecipeDetailView, RecipeSearch, RecipeSelection,
    RecipeSource, RecipeSummary, SearchPanel,
};
use mealplan_store::{Category, KeyValueStore, PlanStore};

// -----------------------------------------------------------------------
// mealplan search <query...>
// -----------------------------------------------------------------------

pub async fn run_search<R: RecipeSource + ?Sized>(source: &R, query: &str) -> Result<()> {
    let panel = search_panel(source, query).await;
    match &panel {
        SearchPanel::Results(items) => print!("{}", format_results(items)),
        SearchPanel::NoMatches => println!("{}", panel.message().unwrap_or_default()),
        other => bail!("{}", other.message().unwrap_or("search did not complete")),
    }
    Ok(())
}

/// Run one search through the same state machine the dashboard uses.
async fn search_panel<R: RecipeSource + ?Sized>(source: &R, query: &str) -> SearchPanel {
    let mut search = RecipeSearch::new();
    let Some((query, ticket)) = search.begin(query) else {
        return search.panel().clone();
    };
    if let Some(result) = ticket.run(source.search(&query)).await {
        search.complete(ticket.seq(), result);
    }
    search.panel().clone()
}

pub fn format_results(items: &[RecipeSummary]) -> String {
    let width = items.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{:<width$}  {}", item.id, item.name);
    }
    out
}

// -----------------------------------------------------------------------
// mealplan recipe <id>
// -----------------------------------------------------------------------

pub async fn run_recipe<R: RecipeSource + ?Sized>(source: &R, id: &str) -> Result<()> {
    let detail = fetch_detail(source, id).await?;
    print!("{}", format_detail(&detail));
    Ok(())
}

async fn fetch_detail<R: RecipeSource + ?Sized>(source: &R, id: &str) -> Result<RecipeDetail> {
    let mut view = RecipeDetailView::new();
    let ticket = view.open(id);
    if let Some(result) = ticket.run(source.lookup(id)).await {
        view.complete(ticket.seq(), result);
    }
    match view.overlay() {
        DetailOverlay::Loaded(detail) => Ok(detail.clone()),
        other => bail!(
            "{} (recipe {id})",
            other.message().unwrap_or("lookup did not complete")
        ),
    }
}

pub fn format_detail(detail: &RecipeDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  (id {})", detail.name, detail.id);
    if let Some(thumb) = &detail.thumbnail {
        let _ = writeln!(out, "{thumb}");
    }
    out.push('\n');
    let _ = writeln!(out, "Ingredients:");
    for ingredient in &detail.ingredients {
        if ingredient.measure.is_empty() {
            let _ = writeln!(out, "  - {}", ingredient.name);
        } else {
            let _ = writeln!(out, "  - {} {}", ingredient.measure, ingredient.name);
        }
    }
    out.push('\n');
    let _ = writeln!(out, "Instructions:");
    let _ = writeln!(out, "{}", detail.instructions.trim());
    out
}

// -----------------------------------------------------------------------
// mealplan import <recipe-id> [--category C]
// -----------------------------------------------------------------------

pub async fn run_import<R: RecipeSource + ?Sized, S: KeyValueStore>(
    source: &R,
    store: &mut PlanStore<S>,
    recipe_id: &str,
    category: Category,
) -> Result<()> {
    let detail = fetch_detail(source, recipe_id).await?;
    let notice = PlanView::new()
        .import_recipe(store, category, RecipeSelection::from(&detail))
        .with_context(|| format!("failed to import recipe {recipe_id}"))?;
    println!("{notice}");
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
