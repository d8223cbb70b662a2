use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "domain_collections=info,collections_cli=info";
const VERBOSE_FILTER: &str = "domain_collections=debug,collections_cli=debug,info";

/// `RUST_LOG` wins over the built-in filters.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    })
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_target(false).compact())
        .init();
}

pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().json().with_current_span(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters() {
        std::env::remove_var("RUST_LOG");

        assert!(filter(false).to_string().contains("domain_collections=info"));
        assert!(filter(true).to_string().contains("domain_collections=debug"));
    }
}
