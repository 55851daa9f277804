use anyhow::Context;
use clap::Parser;
use microcv::config::toml_config::TomlConfig;
use microcv::core::{ConfigProvider, Storage};
use microcv::utils::error::ErrorSeverity;
use microcv::utils::{logger, validation::Validate};
use microcv::{FramePipeline, LocalStorage, VisionEngine};

#[derive(Parser)]
#[command(name = "toml-vision")]
#[command(about = "Frame analysis driven by a TOML run file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "microcv.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override obstacle detection setting from config
    #[arg(long)]
    obstacles: Option<bool>,

    /// Dry run - list the frames that would be analysed
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config file '{}': {}", args.config, e);
            eprintln!("Make sure the file exists and is valid TOML");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Loaded configuration from {}", args.config);

    if let Some(obstacles) = args.obstacles {
        config.detection.obstacles = Some(obstacles);
        tracing::info!("Obstacle detection overridden to: {}", obstacles);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("Dry run, no frames will be analysed");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("System monitoring enabled");
    }

    let source = LocalStorage::new(config.input_dir().to_string());
    let sink = LocalStorage::new(config.output_path().to_string());
    let pipeline = FramePipeline::new(source, sink, config);

    let engine = VisionEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("Frame analysis completed");
            println!("Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "Frame analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let (width, height) = config.frame_size();

    println!("Configuration Summary:");
    println!("  Run: {}", config.run_name());
    println!("  Input: {}", config.input_dir());
    println!("  Extensions: {}", config.extensions().join(", "));
    println!("  Frame: {}x{} ({:?})", width, height, config.frame_format());
    println!("  Output: {}", config.output_path());
    println!("  Obstacles: {}", config.obstacle_detection());

    if args.dry_run {
        println!("  DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let params = config.vision_params();
    let storage = LocalStorage::new(config.input_dir().to_string());
    let files = storage
        .list_files("", config.extensions())
        .await
        .with_context(|| format!("listing frame dumps in {}", config.input_dir()))?;

    println!("Frames:");
    if files.is_empty() {
        if config.test_pattern() {
            println!("  none found, a colour-bar test pattern will be analysed");
        } else {
            println!("  none found, the run would fail");
        }
    }
    for file in &files {
        let format = config
            .frame_format()
            .resolve(file)
            .map(|f| format!("{:?}", f))
            .unwrap_or_else(|_| "unsupported extension".to_string());
        println!("  {} [{}]", file, format);
    }

    println!();
    println!("Detection boxes:");
    println!("  Stop line: {} at {}%", params.stop_line.region, params.stop_line.percent_to_stop);
    println!(
        "  White line: rows from {}, target column {}",
        params.white_line.vertical_crop, params.white_line.center_x
    );
    if config.obstacle_detection() {
        println!(
            "  Obstacle: {} at {}%",
            params.obstacle.region, params.obstacle.percent_to_detect
        );
    }

    println!();
    println!("Outputs:");
    println!("  {}/report.csv", config.output_path());
    println!("  {}/report.json", config.output_path());
    println!("  {}/previews/<frame>.png", config.output_path());
    if config.save_frames() {
        println!("  {}/frames/<frame>.png", config.output_path());
    }
    println!("  {}/microcv_output.zip", config.output_path());

    Ok(())
}
