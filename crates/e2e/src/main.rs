use clap::Parser;

use playlist_e2e::config::SuiteConfig;
use playlist_e2e::{logging, runner};

#[tokio::main]
async fn main() {
	let config = SuiteConfig::parse();
	logging::init_logging(config.verbose);

	match runner::run_suite(config).await {
		Ok(summary) => std::process::exit(summary.exit_code()),
		Err(err) => {
			eprintln!("suite setup failed: {err:#}");
			std::process::exit(2);
		}
	}
}
