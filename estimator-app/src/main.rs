use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use danang_estimator::{
    canonical_key,
    core::config::MapStyle,
    map::headless::{HeadlessLibrary, LoadBehavior},
    prediction::display,
    District, Estimator, EstimatorConfig, FormState, SessionEvent,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "estimator-app")]
#[command(about = "Da Nang real estate price estimator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the inference service for a price and highlight the district
    Predict {
        /// Floor area in m²
        #[arg(long)]
        area: Option<String>,

        #[arg(long)]
        bedroom: Option<String>,

        /// Number of bathrooms
        #[arg(long)]
        wc: Option<String>,

        #[arg(short, long)]
        district: Option<String>,

        /// Base URL of the inference service
        #[arg(long)]
        inference_url: Option<String>,

        /// Map access token; skips the token route
        #[arg(long)]
        token: Option<String>,

        /// Map style: light or dark
        #[arg(long)]
        style: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a district label is matched
    Resolve { label: String },

    /// List the known districts
    Districts,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Predict {
            area,
            bedroom,
            wc,
            district,
            inference_url,
            token,
            style,
            json,
        } => {
            let mut config = EstimatorConfig::from_env();
            if let Some(url) = inference_url {
                config.endpoints.inference_base = url;
            }
            if let Some(token) = token {
                config.public_map_key = Some(token);
            }
            if let Some(style) = style {
                config.map.style = MapStyle::parse(&style)
                    .with_context(|| format!("unknown map style '{style}'"))?;
            }

            let fields = [
                ("area", area),
                ("bedroom", bedroom),
                ("wc", wc),
                ("district", district),
            ];
            predict(config, fields, json).await
        }
        Commands::Resolve { label } => {
            resolve(&label);
            Ok(())
        }
        Commands::Districts => {
            for name in FormState::district_options() {
                if let Some(district) = District::from_label(name) {
                    println!("{:<28} {}", district.full_name(), district.coordinate());
                }
            }
            Ok(())
        }
    }
}

async fn predict(
    config: EstimatorConfig,
    fields: [(&str, Option<String>); 4],
    json: bool,
) -> Result<()> {
    let library = Arc::new(HeadlessLibrary::new(LoadBehavior::Preloaded));
    let mut estimator = Estimator::connect(&config, library)?;

    estimator.session().on("*", |event: &SessionEvent| {
        log::debug!("map event: {:?}", event);
    });

    for (name, value) in fields {
        if let Some(value) = value {
            estimator
                .form_mut()
                .set_field(name, &value)
                .with_context(|| format!("--{name}"))?;
        }
    }

    // The map is a convenience; a failed session does not stop the prediction.
    if let Err(e) = estimator.session().initialize().await {
        log::warn!("map unavailable: {}", e);
    }

    let result = match estimator.submit().await {
        Ok(result) => result.clone(),
        Err(e) => bail!("prediction failed: {e}"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", display::render(&result));
    }

    let session = estimator.session();
    match (session.active_highlight(), session.error_message()) {
        (Some(highlight), _) => println!(
            "\nMap: {} marked at {} (style {})",
            highlight.label,
            highlight.coordinate,
            session.style().url()
        ),
        (None, Some(message)) => println!("\nMap: {message}"),
        (None, None) => println!("\nMap: no location for '{}'", result.district()),
    }

    session.dispose();
    Ok(())
}

fn resolve(label: &str) {
    println!("key: {}", canonical_key(label));
    match danang_estimator::resolve(label) {
        Some(coordinate) => println!("coordinate: {coordinate}"),
        None => println!("coordinate: not a known district"),
    }
}
