use clap::Parser;
use domain_collections::config::script::{evaluate, ScriptFile};
use domain_collections::utils::error::ErrorCategory;
use domain_collections::utils::{logger, validation::Validate};
use domain_collections::CliConfig;

fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Loading declaration script from: {}", config.script);

    let mut script = match ScriptFile::from_file(&config.script) {
        Ok(script) => script,
        Err(e) => {
            tracing::error!("Failed to load script '{}': {}", config.script, e);
            eprintln!("❌ Failed to load script '{}': {}", config.script, e);
            std::process::exit(1);
        }
    };

    // Command line overrides the script
    if let Some(policy) = config.policy {
        script.config.mutation_policy = policy;
        tracing::info!("Mutation policy overridden to: {:?}", policy);
    }

    if let Err(e) = script.validate() {
        tracing::error!("Script validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    tracing::debug!(
        containers = script.containers.len(),
        elements = script.element_count(),
        "script validated"
    );

    match evaluate(&script) {
        Ok(report) => {
            if config.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("❌ Failed to serialize report: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", report.render_text());
            }
        }
        Err(e) => {
            tracing::error!("Evaluation failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e);

            let exit_code = match e.category() {
                ErrorCategory::Configuration => 1,
                ErrorCategory::Naming => 2,
                ErrorCategory::Construction => 3,
                ErrorCategory::Reentrancy => 4,
                ErrorCategory::Listener => 5,
            };
            std::process::exit(exit_code);
        }
    }
}
