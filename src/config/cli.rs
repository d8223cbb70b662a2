use crate::domain::model::MutationPolicy;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "collections-cli")]
#[command(about = "Evaluate a declaration script into named containers")]
pub struct CliConfig {
    /// Path to the TOML declaration script
    #[arg(short, long, default_value = "collections.toml")]
    pub script: String,

    /// Override the mutation policy from the script
    #[arg(long)]
    pub policy: Option<MutationPolicy>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let config = CliConfig::parse_from([
            "collections-cli",
            "--script",
            "decl.toml",
            "--policy",
            "permissive",
            "--json",
        ]);

        assert_eq!(config.script, "decl.toml");
        assert_eq!(config.policy, Some(MutationPolicy::Permissive));
        assert!(config.json);
        assert!(!config.verbose);
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["collections-cli"]);
        assert_eq!(config.script, "collections.toml");
        assert!(config.policy.is_none());
    }
}
