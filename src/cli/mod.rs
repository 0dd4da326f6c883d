use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the chat widget and streaming API over HTTP
    Serve {
        #[arg(short, long, default_value = "7860")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,

        /// Forget conversations idle for this many seconds
        #[arg(long, default_value = "1800")]
        session_ttl_secs: u64,
    },

    /// Send a single message and stream the reply to the terminal
    Ask { message: String },
}
