use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use classweave::classfile::ClassReader;
use classweave::pool::{ClassFileLocator, TypePool};
use classweave::scaffold::MethodGraph;
use classweave::{ClassWeaver, Config, ConstructorStrategy, ElementMatcher, Implementation};

#[derive(Parser)]
#[command(name = "classweave")]
#[command(about = "Runtime JVM class generation toolkit")]
#[command(version)]
struct Cli {
    /// Directories searched for class files of referenced types
    #[arg(short, long = "classpath", value_name = "DIR", global = true)]
    classpath: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the declared surface and the reachable methods of a class file
    Inspect {
        /// Input .class file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Generate a subclass whose methods return default values
    Stub {
        /// Binary name of the super type
        #[arg(value_name = "TYPE")]
        super_type: String,

        /// Binary name of the generated type
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory for .class files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        /// Copy only the public constructors of the super type
        #[arg(long)]
        public_constructors: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let pool = Arc::new(type_pool(&cli.classpath)?);

    match &cli.command {
        Commands::Inspect { input } => inspect(input, &pool)?,
        Commands::Stub { super_type, name, output, public_constructors } => {
            stub(super_type, name.as_deref(), output, *public_constructors, pool)?
        }
    }

    Ok(())
}

fn type_pool(classpath: &[PathBuf]) -> Result<TypePool> {
    let locators = classpath
        .iter()
        .map(|dir| ClassFileLocator::for_directory(dir).with_context(|| format!("cannot index {}", dir.display())))
        .collect::<Result<Vec<_>>>()?;
    Ok(TypePool::new().with_locator(ClassFileLocator::compound(locators)))
}

fn inspect(input: &PathBuf, pool: &TypePool) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let description = ClassReader::new(&bytes).read()?.to_type_description()?;
    println!("{}", description);
    for field in &description.fields {
        println!("  field {} {}", field.field_type, field.name);
    }
    for method in &description.methods {
        println!("  declares {}", method);
    }

    let graph = MethodGraph::compile(&description, pool)?;
    println!("{} reachable methods:", graph.len());
    for node in graph.nodes() {
        let marker = if node.is_conflicting() { " (conflicting)" } else { "" };
        println!("  {}{}", node.representative(), marker);
    }
    Ok(())
}

fn stub(
    super_type: &str,
    name: Option<&str>,
    output: &PathBuf,
    public_constructors: bool,
    pool: Arc<TypePool>,
) -> Result<()> {
    let strategy = if public_constructors {
        ConstructorStrategy::ImitateSuperTypePublic
    } else {
        ConstructorStrategy::ImitateSuperType
    };
    let mut builder = ClassWeaver::with_pool(Config::from_env(), pool)
        .subclass(super_type)?
        .constructor_strategy(strategy)
        .method(ElementMatcher::Any)
        .intercept(Implementation::StubValue);
    if let Some(name) = name {
        builder = builder.name(name);
    }
    let dynamic = builder.make()?;
    for path in dynamic.save_in(output)? {
        info!("wrote {}", path.display());
        println!("{}", path.display());
    }
    Ok(())
}
