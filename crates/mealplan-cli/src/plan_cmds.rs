//! CLI handlers for the plan subcommands.
//!
//! Implements:
//! - `mealplan show [--json]`                -- print the grouped plan
//! - `mealplan add <category> <name...>`     -- add an entry and print its id
//! - `mealplan rename <category> <id> <name...>`
//! - `mealplan remove <category> <id>`       -- idempotent removal
//! - `mealplan clear [--yes]`                -- clear after confirmation

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};

use mealplan_core::{Confirm, GroupBody, Notice, PlanListing, PlanView, RecipeSelection};
use mealplan_store::{Category, EntryId, KeyValueStore, PlanStore};

// -----------------------------------------------------------------------
// mealplan show
// -----------------------------------------------------------------------

pub fn run_show<S: KeyValueStore>(store: &PlanStore<S>, json: bool) -> Result<()> {
    if json {
        let doc = store
            .plan()
            .to_json()
            .context("failed to serialize meal plan")?;
        println!("{doc}");
    } else {
        let listing = PlanView::new().render(store.plan());
        print!("{}", format_listing(&listing));
    }
    Ok(())
}

/// Text form of the listing: one header per category, rows indented with
/// their id, placeholder text under empty groups.
pub fn format_listing(listing: &PlanListing) -> String {
    let mut out = String::new();
    for group in listing.groups() {
        let _ = writeln!(out, "{}", group.header());
        match &group.body {
            GroupBody::Empty { placeholder } => {
                let _ = writeln!(out, "  {placeholder}");
            }
            GroupBody::Rows(rows) => {
                for row in rows {
                    match &row.recipe_ref {
                        Some(recipe) => {
                            let _ = writeln!(out, "  {}  {}  [recipe {recipe}]", row.id, row.text());
                        }
                        None => {
                            let _ = writeln!(out, "  {}  {}", row.id, row.text());
                        }
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

// -----------------------------------------------------------------------
// Mutations
// -----------------------------------------------------------------------

pub fn run_add<S: KeyValueStore>(
    store: &mut PlanStore<S>,
    category: Category,
    name: &str,
    recipe_ref: Option<String>,
) -> Result<()> {
    let (notice, id) = add_entry(store, category, name, recipe_ref)?;
    println!("{notice}");
    println!("{id}");
    Ok(())
}

/// Add through the view so the CLI and dashboard share one validation path.
/// Returns the view's notice and the new entry's id.
fn add_entry<S: KeyValueStore>(
    store: &mut PlanStore<S>,
    category: Category,
    name: &str,
    recipe_ref: Option<String>,
) -> Result<(Notice, EntryId)> {
    let mut view = PlanView::new();
    let added = if recipe_ref.is_some() {
        let selection = RecipeSelection {
            name: name.to_owned(),
            recipe_ref,
        };
        view.import_recipe(store, category, selection)
    } else {
        view.add(store, category, name)
    };
    let notice = added.context("failed to add meal")?;
    if notice.is_rejection() {
        bail!("{notice}");
    }

    let id = store
        .plan()
        .entries(category)
        .last()
        .map(|entry| entry.id.clone())
        .context("added meal is missing from the plan")?;
    Ok((notice, id))
}

pub fn run_rename<S: KeyValueStore>(
    store: &mut PlanStore<S>,
    category: Category,
    id: &str,
    name: &str,
) -> Result<()> {
    let id = EntryId::from(id);
    let mut view = PlanView::new();
    view.begin_edit(store.plan(), category, &id)
        .with_context(|| format!("cannot rename {id}"))?;
    view.set_draft(name)?;

    let notice = view
        .save_edit(store)
        .with_context(|| format!("failed to rename {id}"))?;
    if notice.is_rejection() {
        bail!("{notice}");
    }
    println!("{notice}");
    Ok(())
}

pub fn run_remove<S: KeyValueStore>(
    store: &mut PlanStore<S>,
    category: Category,
    id: &str,
) -> Result<()> {
    let notice = PlanView::new()
        .delete(store, category, &EntryId::from(id))
        .with_context(|| format!("failed to remove {id}"))?;
    println!("{notice}");
    Ok(())
}

pub fn run_clear<S: KeyValueStore, C: Confirm + ?Sized>(
    store: &mut PlanStore<S>,
    confirmer: &mut C,
) -> Result<()> {
    let notice = PlanView::new()
        .clear(store, confirmer)
        .context("failed to clear meal plan")?;
    println!("{notice}");
    Ok(())
}

/// Asks on stderr and reads a `y`/`yes` answer from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use mealplan_store::{MemoryStore, SequentialIds};

    use super::*;

    fn store() -> PlanStore<MemoryStore> {
        PlanStore::open_with_ids(MemoryStore::new(), Box::new(SequentialIds::new("m")))
    }

    #[test]
    fn listing_shows_counts_ids_and_placeholders() {
        let mut store = store();
        store.add(Category::Breakfast, "Eggs").unwrap();
        store
            .add_with_recipe(Category::Dinner, "Chicken Handi", Some("52795".into()))
            .unwrap();

        let text = format_listing(&PlanView::new().render(store.plan()));
        assert!(text.contains("Breakfast (1)\n  m1  Eggs\n"));
        assert!(text.contains("Lunch (0)\n  No meals yet — add or search recipes!\n"));
        assert!(text.contains("Dinner (1)\n  m2  Chicken Handi  [recipe 52795]\n"));
        assert!(text.find("Lunch").unwrap() < text.find("Snack").unwrap());
    }

    #[test]
    fn blank_add_is_refused() {
        let mut store = store();
        let err = run_add(&mut store, Category::Lunch, "   ", None).unwrap_err();
        assert_eq!(err.to_string(), "Enter a meal name");
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn add_trims_and_links_like_the_dashboard() {
        let mut store = store();
        let (notice, plain) = add_entry(&mut store, Category::Lunch, "  Soup ", None).unwrap();
        assert_eq!(notice, Notice::MealAdded);
        assert_eq!(plain, EntryId::from("m1"));

        let (notice, linked) =
            add_entry(&mut store, Category::Dinner, "Chicken Handi", Some("52795".into())).unwrap();
        assert_eq!(notice.to_string(), "Added \"Chicken Handi\" to Dinner");
        assert_eq!(linked, EntryId::from("m2"));
        assert_eq!(store.plan().entries(Category::Lunch)[0].name, "Soup");
        let dinner = &store.plan().entries(Category::Dinner)[0];
        assert_eq!(dinner.recipe_ref.as_deref(), Some("52795"));
        assert_eq!(store.storage().writes(), 2);
    }

    #[test]
    fn blank_add_with_recipe_is_refused() {
        let mut store = store();
        let err = run_add(&mut store, Category::Dinner, " ", Some("52795".into())).unwrap_err();
        assert_eq!(err.to_string(), "Enter a meal name");
        assert!(store.plan().is_empty());
    }

    #[test]
    fn rename_and_remove_through_the_view() {
        let mut store = store();
        store.add(Category::Snack, "Apple").unwrap();

        run_rename(&mut store, Category::Snack, "m1", "  Pear ").unwrap();
        assert_eq!(store.plan().entries(Category::Snack)[0].name, "Pear");

        let err = run_rename(&mut store, Category::Snack, "m1", " ").unwrap_err();
        assert_eq!(err.to_string(), "Name cannot be empty");

        assert!(run_rename(&mut store, Category::Lunch, "m1", "Pear").is_err());

        run_remove(&mut store, Category::Snack, "m1").unwrap();
        run_remove(&mut store, Category::Snack, "m1").unwrap();
        assert!(store.plan().is_empty());
    }

    #[test]
    fn declined_clear_keeps_plan() {
        let mut store = store();
        store.add(Category::Lunch, "Soup").unwrap();

        run_clear(&mut store, &mut |_: &str| false).unwrap();
        assert_eq!(store.plan().len(), 1);

        run_clear(&mut store, &mut |_: &str| true).unwrap();
        assert!(store.plan().is_empty());
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }
}
