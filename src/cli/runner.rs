//! CLI runner - executes commands

use crate::cli::commands::Cli;
use crate::commands::{self, CommandStats, EventSink, JsonLinesSink};
use crate::config::{ConfigFile, Environment};
use crate::error::Result;
use std::io;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command, writing events to stdout
    pub async fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut sink = JsonLinesSink::new(stdout.lock());
        let stats = self.run_with_sink(&mut sink).await?;
        sink.into_inner()?;
        info!("Wrote {} event(s)", stats.events);
        Ok(())
    }

    /// Run the selected command against any sink.
    ///
    /// Config and query failures become a single error event; only a failing
    /// sink is returned as an error.
    pub async fn run_with_sink(&self, sink: &mut dyn EventSink) -> Result<CommandStats> {
        let command = self.cli.command.to_command();
        debug!("Parsed command: {:?}", command);

        match self.load_environment() {
            Ok(env) => commands::run(&env, &command, sink).await,
            Err(e) => {
                commands::emit_failure(sink, &e)?;
                Ok(CommandStats {
                    events: 1,
                    walks: 0,
                })
            }
        }
    }

    /// Load the configured environment
    fn load_environment(&self) -> Result<Environment> {
        debug!(
            "Loading environment '{}' from {}",
            self.cli.env,
            self.cli.config.display()
        );
        ConfigFile::from_file(&self.cli.config)?.environment(&self.cli.env)
    }
}
