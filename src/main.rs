//! Control Plane Machine Config
//!
//! Command line front end for the provider config core: normalize a provider
//! spec against the cluster's failure domains, inject a failure domain into
//! it, or recover the failure domain it is placed in.

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use control_plane_machine_config::{
    ClusterInfrastructure, FailureDomain, FailureDomainPlacement, FileInfrastructure,
    FolderPolicy, Infrastructure, InfrastructureSource, PlacementPolicy, ProviderConfig,
    ProviderConfigFactory, TemplatePolicy, TemplateSynthesis,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Control Plane Machine Config - failure domain placement for provider specs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Infrastructure manifest (YAML or JSON)
    #[arg(long, env = "INFRASTRUCTURE_FILE", global = true, conflicts_with = "from_cluster")]
    infrastructure: Option<PathBuf>,

    /// Read the Infrastructure from the cluster instead of a file
    #[arg(long, env = "FROM_CLUSTER", global = true)]
    from_cluster: bool,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Output format for provider specs
    #[arg(long, env = "OUTPUT", value_enum, default_value = "yaml", global = true)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a provider spec and print it as the factory normalizes it
    Normalize(SpecArgs),

    /// Inject a failure domain into a provider spec
    Inject {
        #[command(flatten)]
        spec: SpecArgs,

        /// Name of the failure domain to inject
        #[arg(long, short = 'f')]
        failure_domain: String,
    },

    /// Print the failure domain a provider spec is placed in
    Extract(SpecArgs),

    /// List the failure domains the Infrastructure declares
    FailureDomains,
}

#[derive(ClapArgs, Debug)]
struct SpecArgs {
    /// Provider spec (YAML or JSON)
    #[arg(long, short = 'p', env = "PROVIDER_SPEC")]
    provider_spec: PathBuf,

    /// Pick the platform from the spec's kind instead of the Infrastructure
    #[arg(long)]
    from_kind: bool,
}

#[derive(ClapArgs, Debug)]
struct PolicyArgs {
    /// Placement policy file (YAML); flags below override it
    #[arg(long, env = "PLACEMENT_POLICY", global = true)]
    policy: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    template_policy: Option<TemplatePolicy>,

    #[arg(long, value_enum, global = true)]
    template_synthesis: Option<TemplateSynthesis>,

    #[arg(long, value_enum, global = true)]
    folder_policy: Option<FolderPolicy>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting {} {}", control_plane_machine_config::NAME, control_plane_machine_config::VERSION);

    let infrastructure = load_infrastructure(&args).await?;
    let factory = ProviderConfigFactory::new(load_policy(&args.policy)?);

    match &args.command {
        Command::Normalize(spec) => {
            let config = build(&factory, spec, &infrastructure)?;
            print_config(&config, args.output)?;
        }
        Command::Inject {
            spec,
            failure_domain,
        } => {
            let config = build(&factory, spec, &infrastructure)?;
            let target = FailureDomain::vsphere(failure_domain.as_str());

            if !infrastructure.failure_domains().contains(&target) {
                tracing::warn!(failure_domain = %target, "failure domain not declared, spec left unchanged");
            }

            let injected = config.inject_failure_domain(&target);
            for difference in config.diff(&injected)? {
                info!("changed {}", difference);
            }
            print_config(&injected, args.output)?;
        }
        Command::Extract(spec) => {
            let config = build(&factory, spec, &infrastructure)?;
            println!("{}", config.extract_failure_domain());
        }
        Command::FailureDomains => {
            for failure_domain in infrastructure.failure_domains() {
                println!("{}", failure_domain);
            }
        }
    }

    Ok(())
}

// =============================================================================
// Inputs
// =============================================================================

async fn load_infrastructure(args: &Args) -> anyhow::Result<Infrastructure> {
    let infrastructure = if args.from_cluster {
        ClusterInfrastructure::try_default()
            .await
            .context("connecting to the cluster")?
            .infrastructure()
            .await
            .context("fetching the cluster infrastructure")?
    } else {
        let path = args
            .infrastructure
            .as_ref()
            .context("either --infrastructure or --from-cluster is required")?;
        FileInfrastructure::new(path)
            .infrastructure()
            .await
            .with_context(|| format!("reading infrastructure from {}", path.display()))?
    };

    Ok(infrastructure)
}

fn load_policy(args: &PolicyArgs) -> anyhow::Result<PlacementPolicy> {
    let mut policy = match &args.policy {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading placement policy {}", path.display()))?;
            PlacementPolicy::from_yaml(&contents)?
        }
        None => PlacementPolicy::default(),
    };

    if let Some(template) = args.template_policy {
        policy.template = template;
    }
    if let Some(synthesis) = args.template_synthesis {
        policy.template_synthesis = synthesis;
    }
    if let Some(folder) = args.folder_policy {
        policy.folder = folder;
    }

    Ok(policy)
}

/// Read a YAML or JSON provider spec and hand its JSON bytes to the factory
fn build<'a>(
    factory: &ProviderConfigFactory,
    spec: &SpecArgs,
    infrastructure: &'a Infrastructure,
) -> anyhow::Result<ProviderConfig<'a>> {
    let contents = std::fs::read_to_string(&spec.provider_spec)
        .with_context(|| format!("reading provider spec {}", spec.provider_spec.display()))?;
    let value: serde_json::Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing provider spec {}", spec.provider_spec.display()))?;
    let raw = serde_json::to_vec(&value)?;

    let config = if spec.from_kind {
        factory.build_from_kind(&raw, infrastructure)?
    } else {
        factory.build(&raw, infrastructure)?
    };
    Ok(config)
}

fn print_config(config: &ProviderConfig<'_>, output: OutputFormat) -> anyhow::Result<()> {
    let value = config.to_value()?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&value)?),
    }
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().expect("static directive"))
        .add_directive("kube=info".parse().expect("static directive"));

    // Logs go to stderr so printed specs stay clean on stdout
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
