pub mod server;

/// What the process was asked to do once the command line is parsed.
#[derive(Debug)]
pub enum Action {
    /// Serve the code API until SIGINT or SIGTERM.
    Server(server::Args),
}

impl Action {
    /// # Errors
    /// Returns an error if the directory configuration is invalid, the listen
    /// address cannot be bound, or the server stops with an error.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
        }
    }
}
