//! batchmesh CLI - batch tessellation and STL export of document objects

use anyhow::{Context, Result, bail};
use batchmesh_core::document::{Document, ObjectId, ObjectKind, PropertyValue};
use batchmesh_core::shape::Shape;
use batchmesh_engine::{Command, Engine, INPUT_LABEL, LogProgress, ensure_groups, schema};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "batchmesh")]
#[command(about = "Tessellate and export all parts in a document's mesh_input group", long_about = None)]
#[command(version)]
struct Cli {
    /// Log every progress step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new document with empty mesh_input and mesh_output groups
    Init {
        /// Document file to create
        document: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Add a part to the document
    Part {
        document: PathBuf,

        /// Display label of the new part
        label: String,

        /// Shape as JSON, e.g. '{"type":"cylinder","radius":5,"height":40}'
        shape: String,
    },

    /// Link objects, selected by label, into mesh_input (Batch Add)
    Add {
        document: PathBuf,

        /// Labels of the objects to add
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Mesh every object in mesh_input and write STL files (Batch Mesh Export)
    Export { document: PathBuf },

    /// Change a mesh export setting on mesh_input
    Set {
        document: PathBuf,

        /// MeshLinearDeflection, MeshAngularDeflection or ExportSTL
        field: String,

        value: String,
    },

    /// Show or hide an object, selected by label
    Visibility {
        document: PathBuf,

        label: String,

        #[arg(action = clap::ArgAction::Set)]
        visible: bool,
    },

    /// Print the document tree and mesh export settings
    Show { document: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { document, force } => run_init(&document, force)?,
        Commands::Part {
            document,
            label,
            shape,
        } => run_part(&document, &label, &shape)?,
        Commands::Add { document, labels } => run_add(&document, &labels)?,
        Commands::Export { document } => run_export(&document)?,
        Commands::Set {
            document,
            field,
            value,
        } => run_set(&document, &field, &value)?,
        Commands::Visibility {
            document,
            label,
            visible,
        } => run_visibility(&document, &label, visible)?,
        Commands::Show { document } => run_show(&document)?,
    }

    Ok(())
}

fn load(path: &Path) -> Result<Document> {
    let doc = Document::load(path)
        .with_context(|| format!("Failed to open document {}", path.display()))?;
    tracing::debug!("Loaded {} ({} objects)", path.display(), doc.len());
    Ok(doc)
}

fn save(doc: &Document) -> Result<()> {
    doc.save().context("Failed to save document")
}

/// Resolve labels to object ids, refusing unknown labels
fn select(doc: &Document, labels: &[String]) -> Result<Vec<ObjectId>> {
    let mut selection = Vec::new();
    for label in labels {
        let found: Vec<ObjectId> = doc.find_by_label(label).map(|o| o.id).collect();
        if found.is_empty() {
            bail!("No object labelled '{}'", label);
        }
        selection.extend(found);
    }
    Ok(selection)
}

fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let mut doc = Document::with_path(path);
    ensure_groups(&mut doc)?;
    save(&doc)?;
    println!("Created {}", path.display());
    Ok(())
}

fn run_part(path: &Path, label: &str, shape: &str) -> Result<()> {
    let shape: Shape = serde_json::from_str(shape).context("Invalid shape JSON")?;
    let mut doc = load(path)?;
    let id = doc.add_object(ObjectKind::Part { shape }, label);
    save(&doc)?;
    println!("Added part '{}' ({})", label, doc.object(id)?.name);
    Ok(())
}

fn run_add(path: &Path, labels: &[String]) -> Result<()> {
    let mut doc = load(path)?;
    let selection = select(&doc, labels)?;
    if !Command::Add.is_available(&selection) {
        bail!("Nothing selected");
    }

    let links = Engine::new().batch_add(&mut doc, &selection)?;
    save(&doc)?;
    println!("Added {} links to {}", links.len(), INPUT_LABEL);
    Ok(())
}

fn run_export(path: &Path) -> Result<()> {
    let mut doc = load(path)?;
    let mut progress = LogProgress::default();

    let report = Engine::new()
        .batch_export(&mut doc, &mut progress)
        .context("Batch mesh export failed")?;
    save(&doc)?;
    println!("{}", report);
    Ok(())
}

fn run_set(path: &Path, name: &str, value: &str) -> Result<()> {
    let field = schema::field(name).with_context(|| {
        let known: Vec<&str> = schema::FIELDS.iter().map(|f| f.name).collect();
        format!("Unknown setting '{}' (expected one of {})", name, known.join(", "))
    })?;
    let value = PropertyValue::parse(field.kind, value)
        .with_context(|| format!("'{}' is not a valid {}", value, field.kind.name()))?;

    let mut doc = load(path)?;
    let groups = ensure_groups(&mut doc)?;
    schema::set(doc.object_mut(groups.input)?, field, value)?;
    save(&doc)?;
    println!("{} = {}", field.name, value);
    Ok(())
}

fn run_visibility(path: &Path, label: &str, visible: bool) -> Result<()> {
    let mut doc = load(path)?;
    for id in select(&doc, &[label.to_string()])? {
        doc.set_visible(id, visible)?;
    }
    save(&doc)?;
    Ok(())
}

fn run_show(path: &Path) -> Result<()> {
    let doc = load(path)?;

    // Top-level objects first, group members indented beneath their group
    for object in doc.objects().filter(|o| doc.owner_group(o.id).is_none()) {
        print_object(&doc, object.id, 0)?;
    }

    if let Some(input) = doc.find_groups_by_label(INPUT_LABEL).first() {
        println!();
        println!("Settings:");
        let input = doc.object(*input)?;
        for field in &schema::FIELDS {
            let value = input
                .properties
                .value(field.name)
                .map_or_else(|| format!("{} (default)", field.default), |v| v.to_string());
            println!("  {:<24} {}", field.name, value);
        }
    }
    Ok(())
}

fn print_object(doc: &Document, id: ObjectId, depth: usize) -> Result<()> {
    let object = doc.object(id)?;
    let detail = match &object.kind {
        ObjectKind::Group { members } => format!("{} members", members.len()),
        ObjectKind::Part { .. } => String::new(),
        ObjectKind::Link { target } => match target.and_then(|t| doc.object(t).ok()) {
            Some(t) => format!("-> {}", t.label),
            None => "-> (broken)".to_string(),
        },
        ObjectKind::Mesh { mesh } => format!("{} triangles", mesh.triangle_count()),
    };
    println!(
        "{}{} [{}] {}{}",
        "  ".repeat(depth),
        object.label,
        object.kind.type_name(),
        detail,
        if object.visible { "" } else { " (hidden)" }
    );
    for member in object.members() {
        print_object(doc, *member, depth + 1)?;
    }
    Ok(())
}
