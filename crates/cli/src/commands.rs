//! Command handlers
//!
//! Each handler prints a human-readable report on stdout and returns an
//! error for anything that should make the process exit non-zero.

use anyhow::{Context, bail};
use colored::Colorize;
use formforge_editor::{EditorConfig, RuleOutcome, SchemaStore};
use formforge_schema::{
    BlueprintCatalog, BlueprintCategory, Condition, ConditionalVisibilityRule, FieldPath,
    ImportOptions, ImportReport, RuleAction, Schema, decompile, load_schema, preview,
    save_schema,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Rule arguments from the command line
#[derive(Debug, Clone)]
pub struct RuleRequest {
    pub parent: String,
    pub condition: Condition,
    pub action: RuleAction,
    pub value: Option<String>,
}

// ============================================================================
// catalog
// ============================================================================

pub fn catalog() -> anyhow::Result<()> {
    let catalog = BlueprintCatalog::standard();
    for category in BlueprintCategory::all() {
        println!("{}", category.display_name().bold());
        for blueprint in catalog.by_category(*category) {
            let field = &blueprint.default_field;
            println!(
                "  {:<10} {:<8} {}",
                blueprint.key.cyan(),
                field.field_type.as_str(),
                field.label(&blueprint.key)
            );
        }
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn validate(file: &Path, lenient: bool) -> anyhow::Result<()> {
    let options = if lenient {
        ImportOptions::lenient()
    } else {
        ImportOptions::strict()
    };

    match load_schema(file, options) {
        Ok(report) => {
            print_warnings(&report);
            println!(
                "{} {} is valid ({} fields)",
                "✓".green(),
                file.display(),
                report.schema.field_count()
            );
            Ok(())
        }
        Err(e) if !e.violations().is_empty() => {
            let violations = e.violations();
            println!(
                "{} {} has {} violation(s):",
                "✗".red(),
                file.display(),
                violations.len()
            );
            for violation in violations {
                println!("  - {}", violation);
            }
            bail!("{} is not a valid schema", file.display())
        }
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// inspect
// ============================================================================

pub fn inspect(file: &Path) -> anyhow::Result<()> {
    let report = load_schema(file, ImportOptions::lenient())?;
    print_warnings(&report);
    let schema = &report.schema;

    println!("{} ({} fields)", file.display().to_string().bold(), schema.field_count());
    for (path, node) in schema.ordered_fields(&FieldPath::root())? {
        let indent = "  ".repeat(path.depth());
        let key = path.key().unwrap_or_default();
        println!(
            "{indent}{} {} {}",
            key.cyan(),
            format!("[{}]", node.field_type).dimmed(),
            node.label(key)
        );
        if let Some(options) = &node.options {
            let values: Vec<String> = options.iter().map(|o| o.value.to_string()).collect();
            println!("{indent}  options: {}", values.join(", "));
        }
        if let Some(line) = rule_line(schema, node.reactions.as_ref()) {
            println!("{indent}  {}", line);
        }
    }
    Ok(())
}

fn rule_line(
    schema: &Schema,
    reaction: Option<&formforge_schema::ConditionalReaction>,
) -> Option<String> {
    let reaction = reaction?;
    let rule = decompile(reaction)?;
    let label = schema
        .label_of(&rule.parent_field)
        .unwrap_or_else(|| rule.parent_field.to_string());
    let mut line = preview(&rule, &label);
    if reaction.dangling {
        line.push_str(" (dangling)");
    } else if !rule.enabled {
        line.push_str(" (disabled)");
    }
    if reaction.incomplete {
        line.push_str(" (incomplete)");
    }
    Some(if reaction.is_inert() {
        line.dimmed().to_string()
    } else {
        line.yellow().to_string()
    })
}

// ============================================================================
// new
// ============================================================================

pub fn new(file: &Path, fields: &[String], force: bool, config: EditorConfig) -> anyhow::Result<()> {
    if file.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", file.display());
    }

    let mut store = SchemaStore::new(Arc::new(BlueprintCatalog::standard()), config);
    for entry in fields {
        let (parent, blueprint) = match entry.rsplit_once('/') {
            Some((parent, blueprint)) => (Some(FieldPath::parse(&parent.replace('/', "."))?), blueprint),
            None => (None, entry.as_str()),
        };
        let path = store
            .add_field(blueprint, parent.as_ref(), None)
            .with_context(|| format!("Cannot add '{entry}'"))?;
        println!("  {} {}", "+".green(), path);
    }

    store.save_with(|schema| save_schema(schema, file))?;
    println!(
        "{} Created {} with {} field(s)",
        "✓".green(),
        file.display(),
        store.schema().field_count()
    );
    Ok(())
}

// ============================================================================
// rule
// ============================================================================

pub fn rule(
    file: &Path,
    field: &str,
    request: Option<RuleRequest>,
    config: EditorConfig,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let mut store = SchemaStore::new(Arc::new(BlueprintCatalog::standard()), config);
    store.import_json(&json, ImportOptions::strict())?;

    let owner = FieldPath::parse(field)?;
    let rule = match request {
        None => None,
        Some(request) => {
            let mut rule = ConditionalVisibilityRule::new(
                FieldPath::parse(&request.parent)?,
                request.condition,
                request.action,
            );
            if let Some(raw) = &request.value {
                rule = rule.with_target(parse_value(raw));
            }
            Some(rule)
        }
    };

    match store.apply_rule(&owner, rule)? {
        RuleOutcome::Applied(compiled) => {
            println!("{} {}: {}", "✓".green(), owner, compiled.preview);
            if compiled.incomplete {
                println!(
                    "{} no target value yet; the condition counts as met until one is set",
                    "!".yellow()
                );
            }
        }
        RuleOutcome::Cleared => println!("{} Cleared rule on {}", "✓".green(), owner),
    }

    store.save_with(|schema| save_schema(schema, file))?;
    Ok(())
}

/// JSON literal if it parses as one, otherwise the raw text as a string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_warnings(report: &ImportReport) {
    for warning in &report.warnings {
        println!("{} {}", "!".yellow(), warning);
    }
}
