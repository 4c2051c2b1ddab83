use agentgen_codegen::{Design, load_design, plan_toolset_transforms, render_transforms};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "agentgen")]
#[command(about = "agentgen - Plan and render toolset transforms from a design document", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the transform plan of each toolset as JSON
    Plan {
        /// Path to the design YAML file
        #[arg(short, long)]
        design: PathBuf,

        /// Generated-root import prefix (overrides the design's root)
        #[arg(short, long)]
        root: Option<String>,

        /// Only plan the named toolset
        #[arg(short, long)]
        toolset: Option<String>,
    },
    /// Render transforms.go for each toolset
    Render {
        /// Path to the design YAML file
        #[arg(short, long)]
        design: PathBuf,

        /// Generated-root import prefix (overrides the design's root)
        #[arg(short, long)]
        root: Option<String>,

        /// Directory to write files under (prints to stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            design,
            root,
            toolset,
        } => plan(&design, root, toolset)?,
        Commands::Render { design, root, out } => render(&design, root, out)?,
    }

    Ok(())
}

fn load(path: &Path, root: Option<String>) -> Result<(Design, String)> {
    log::info!("Loading design from {:?}", path);
    let design =
        load_design(path).with_context(|| format!("failed to load design {}", path.display()))?;
    let Some(root) = root.or_else(|| design.root.clone()) else {
        anyhow::bail!("Either --root or a design `root` must be specified");
    };
    Ok((design, root))
}

fn plan(path: &Path, root: Option<String>, only: Option<String>) -> Result<()> {
    let (design, root) = load(path, root)?;
    if let Some(name) = &only
        && design.toolset(name).is_none()
    {
        anyhow::bail!("toolset {name} is not declared in {}", path.display());
    }

    let mut plans = Vec::new();
    for toolset in &design.toolsets {
        if only.as_deref().is_some_and(|name| name != toolset.name) {
            continue;
        }
        let plan = plan_toolset_transforms(&root, toolset)?;
        plans.push(serde_json::json!({
            "toolset": toolset.name,
            "plan": plan,
        }));
    }
    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}

fn render(path: &Path, root: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let (design, root) = load(path, root)?;
    for toolset in &design.toolsets {
        let Some(plan) = plan_toolset_transforms(&root, toolset)? else {
            log::info!("Toolset {}: nothing to generate", toolset.name);
            continue;
        };
        let source = render_transforms(&plan)?;
        match &out {
            Some(dir) => {
                let target = dir.join(&plan.path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                std::fs::write(&target, source)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                log::info!("Wrote {}", target.display());
            }
            None => {
                println!("// {}", plan.path);
                print!("{source}");
            }
        }
    }
    Ok(())
}
